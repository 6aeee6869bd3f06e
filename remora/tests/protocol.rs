//! End-to-end sessions over in-memory channels: helper and both servers run
//! the real protocol, and the reconstructed output must match the cleartext
//! update rule mod 2³².

use halyard::ring::ShareMat;
use halyard::{unix_channel_pair, AesRng};
use pharos::{point, TwisterPrg};
use rand::SeedableRng;
use remora::config::Params;
use remora::queries::{self, Dataset, Query};
use remora::server::ServerSession;
use remora::{check, helper, Role};
use std::thread;

/// Run one full session and return the reconstructed (U, V).
fn run_protocol(dataset: &Dataset, params: Params) -> (ShareMat, ShareMat) {
    let (mut helper_end0, mut server_end0) = unix_channel_pair();
    let (mut helper_end1, mut server_end1) = unix_channel_pair();
    let (mut peer0, mut peer1) = unix_channel_pair();

    let helper_thread = thread::spawn(move || {
        helper::serve(&mut helper_end0, &mut helper_end1, &params, &mut AesRng::new()).unwrap();
    });

    let users1 = dataset.user_shares[1].clone();
    let items1 = dataset.item_shares[1].clone();
    let queries1 = dataset.queries[1].clone();
    let server1_thread = thread::spawn(move || {
        let mut session = ServerSession::new(Role::P1, users1, items1).unwrap();
        session
            .run(&mut peer1, &mut server_end1, &queries1)
            .unwrap();
        session.into_shares()
    });

    let mut session = ServerSession::new(
        Role::P0,
        dataset.user_shares[0].clone(),
        dataset.item_shares[0].clone(),
    )
    .unwrap();
    session
        .run(&mut peer0, &mut server_end0, &dataset.queries[0])
        .unwrap();
    let (u0, v0) = session.into_shares();
    let (u1, v1) = server1_thread.join().unwrap();
    helper_thread.join().unwrap();

    (check::reconstruct(&u0, &u1), check::reconstruct(&v0, &v1))
}

/// The cleartext reference result for the same session.
fn cleartext_result(dataset: &Dataset) -> (ShareMat, ShareMat) {
    let mut users = check::reconstruct(&dataset.user_shares[0], &dataset.user_shares[1]);
    let mut items = check::reconstruct(&dataset.item_shares[0], &dataset.item_shares[1]);
    check::apply_update_rule(&mut users, &mut items, &dataset.cleartext);
    (users, items)
}

fn assert_mod32_eq(protocol: &ShareMat, cleartext: &ShareMat, label: &'static str) {
    let diffs = check::diff_mod32(label, protocol, cleartext);
    assert!(diffs.is_empty(), "{} diverged: {:?}", label, diffs);
}

// m = 1, n = 4, k = 2, one query (0, 2). Cleartext: <u,v> = 8, delta = -7,
// u becomes [-11, -13] and V[2] becomes [-19, -5]; other rows untouched.
#[test]
fn test_single_query_known_answer() {
    let mut rng = AesRng::from_seed([21u8; 16]);
    let users = vec![vec![3i64, 1]];
    let items = vec![vec![1i64, 0], vec![0, 1], vec![2, 2], vec![-1, 1]];

    let (k0, k1) = point::gen(&TwisterPrg, 2, 0, 4, &mut rng);
    let dataset = Dataset {
        user_shares: [users, vec![vec![0i64; 2]; 1]],
        item_shares: [items, vec![vec![0i64; 2]; 4]],
        queries: [
            vec![Query {
                user_index: 0,
                item_share: 5,
                key: k0,
            }],
            vec![Query {
                user_index: 0,
                item_share: -3,
                key: k1,
            }],
        ],
        cleartext: vec![(0, 2)],
    };
    let params = Params {
        users: 1,
        items: 4,
        features: 2,
        queries: 1,
    };

    let (u, v) = run_protocol(&dataset, params);
    assert_eq!(u, vec![vec![-11i64, -13]]);
    assert_eq!(
        v,
        vec![vec![1i64, 0], vec![0, 1], vec![-19, -5], vec![-1, 1]]
    );
}

#[test]
fn test_default_scale_matches_cleartext() {
    let params = Params {
        users: 3,
        items: 5,
        features: 3,
        queries: 10,
    };
    let mut rng = AesRng::from_seed([22u8; 16]);
    let dataset = queries::generate(&params, &mut rng);

    let (u, v) = run_protocol(&dataset, params);
    let (cu, cv) = cleartext_result(&dataset);
    assert_mod32_eq(&u, &cu, "U");
    assert_mod32_eq(&v, &cv, "V");
}

// The shares must agree with the cleartext state after every query, not
// just at session end: replay each prefix of the stream as its own session.
#[test]
fn test_every_prefix_matches_cleartext() {
    let base = Params {
        users: 2,
        items: 4,
        features: 2,
        queries: 4,
    };
    let mut rng = AesRng::from_seed([26u8; 16]);
    let dataset = queries::generate(&base, &mut rng);

    for prefix in 1..=base.queries as usize {
        let truncated = Dataset {
            user_shares: dataset.user_shares.clone(),
            item_shares: dataset.item_shares.clone(),
            queries: [
                dataset.queries[0][..prefix].to_vec(),
                dataset.queries[1][..prefix].to_vec(),
            ],
            cleartext: dataset.cleartext[..prefix].to_vec(),
        };
        let params = Params {
            queries: prefix as u32,
            ..base
        };
        let (u, v) = run_protocol(&truncated, params);
        let (cu, cv) = cleartext_result(&truncated);
        assert_mod32_eq(&u, &cu, "U");
        assert_mod32_eq(&v, &cv, "V");
    }
}

// Two queries with the same (i, j) must chain exactly like the two-step
// cleartext simulation.
#[test]
fn test_repeated_query_composes() {
    let params = Params {
        users: 2,
        items: 4,
        features: 2,
        queries: 2,
    };
    let mut rng = AesRng::from_seed([23u8; 16]);
    let mut dataset = queries::generate(&params, &mut rng);

    // Overwrite the generated stream with the same (1, 3) twice, keeping
    // fresh shares and keys per query.
    let mut queries0 = Vec::new();
    let mut queries1 = Vec::new();
    for _ in 0..2 {
        let share0 = 4096i64;
        let share1 = 3i64.wrapping_sub(share0);
        let (k0, k1) = point::gen(&TwisterPrg, 3, 0, 4, &mut rng);
        queries0.push(Query {
            user_index: 1,
            item_share: share0,
            key: k0,
        });
        queries1.push(Query {
            user_index: 1,
            item_share: share1,
            key: k1,
        });
    }
    dataset.queries = [queries0, queries1];
    dataset.cleartext = vec![(1, 3), (1, 3)];

    let (u, v) = run_protocol(&dataset, params);
    let (cu, cv) = cleartext_result(&dataset);
    assert_mod32_eq(&u, &cu, "U");
    assert_mod32_eq(&v, &cv, "V");
}

// File-level round trip: generated session files in, updated share files
// out, checker verdict on top.
#[test]
fn test_checker_accepts_honest_run_and_flags_corruption() {
    use remora::{config, matrix};

    let params = Params {
        users: 3,
        items: 8,
        features: 2,
        queries: 4,
    };
    let mut rng = AesRng::from_seed([25u8; 16]);
    let dataset = queries::generate(&params, &mut rng);

    let dir = tempfile::tempdir().unwrap();
    dataset.write_to(dir.path()).unwrap();

    // Stand in for the two server processes: run the session in memory and
    // save the updated shares where they would.
    let (mut helper_end0, mut server_end0) = unix_channel_pair();
    let (mut helper_end1, mut server_end1) = unix_channel_pair();
    let (mut peer0, mut peer1) = unix_channel_pair();
    let helper_thread = thread::spawn(move || {
        helper::serve(&mut helper_end0, &mut helper_end1, &params, &mut AesRng::new()).unwrap();
    });
    let users1 = dataset.user_shares[1].clone();
    let items1 = dataset.item_shares[1].clone();
    let queries1 = dataset.queries[1].clone();
    let server1_thread = thread::spawn(move || {
        let mut session = ServerSession::new(Role::P1, users1, items1).unwrap();
        session
            .run(&mut peer1, &mut server_end1, &queries1)
            .unwrap();
        session.into_shares()
    });
    let mut session = ServerSession::new(
        Role::P0,
        dataset.user_shares[0].clone(),
        dataset.item_shares[0].clone(),
    )
    .unwrap();
    session
        .run(&mut peer0, &mut server_end0, &dataset.queries[0])
        .unwrap();
    let (u0, v0) = session.into_shares();
    let (u1, v1) = server1_thread.join().unwrap();
    helper_thread.join().unwrap();

    for (role, users, items) in [(Role::P0, &u0, &v0), (Role::P1, &u1, &v1)] {
        matrix::save(&config::updated_user_share_path(dir.path(), role), users).unwrap();
        matrix::save(&config::updated_item_share_path(dir.path(), role), items).unwrap();
    }

    assert!(check::run(dir.path(), &params).unwrap().is_empty());

    // Corrupt one cell of P0's updated V file and the checker must object.
    let mut corrupted = v0.clone();
    corrupted[5][1] = corrupted[5][1].wrapping_add(1);
    matrix::save(
        &config::updated_item_share_path(dir.path(), Role::P0),
        &corrupted,
    )
    .unwrap();
    let mismatches = check::run(dir.path(), &params).unwrap();
    assert_eq!(mismatches.len(), 1);
    assert_eq!((mismatches[0].row, mismatches[0].col), (5, 1));
    assert_eq!(mismatches[0].matrix, "V");
}

#[test]
fn test_wide_item_domain() {
    // n well past the last power of two exercises the rounded-up DPF depth
    // and the rotation reduction on every query.
    let params = Params {
        users: 4,
        items: 50,
        features: 3,
        queries: 5,
    };
    let mut rng = AesRng::from_seed([24u8; 16]);
    let dataset = queries::generate(&params, &mut rng);

    let (u, v) = run_protocol(&dataset, params);
    let (cu, cv) = cleartext_result(&dataset);
    assert_mod32_eq(&u, &cu, "U");
    assert_mod32_eq(&v, &cv, "V");
}
