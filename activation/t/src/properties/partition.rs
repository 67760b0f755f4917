// Copyright © 2022 The Radicle Link Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use link_activation::{partition, socket::wrap, Error};
use proptest::prelude::*;

use crate::gen::{self, Fd};

/// Indices of the TCP descriptors expected in the rpc group.
fn expected_rpc(tcp: usize) -> Vec<usize> {
    if tcp >= 2 {
        vec![1]
    } else {
        vec![]
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn every_tcp_listener_lands_in_one_group(fds in gen::valid_fds()) {
        let opened = gen::open_all(&fds);
        let groups = partition(wrap(gen::inherited(&opened))).unwrap();
        let tcp = gen::tcp_addrs(&opened);

        let rpc = expected_rpc(tcp.len())
            .into_iter()
            .map(|i| tcp[i])
            .collect::<Vec<_>>();
        let plain = tcp
            .iter()
            .copied()
            .filter(|addr| !rpc.contains(addr))
            .collect::<Vec<_>>();

        prop_assert_eq!(
            groups.rpc.iter().map(|l| l.local_addr().unwrap()).collect::<Vec<_>>(),
            rpc
        );
        prop_assert_eq!(
            groups.plain.iter().map(|l| l.local_addr().unwrap()).collect::<Vec<_>>(),
            plain
        );
        prop_assert_eq!(
            groups.udp.iter().map(|s| s.local_addr().unwrap()).collect::<Vec<_>>(),
            gen::udp_addrs(&opened)
        );
    }

    #[test]
    fn udp_never_affects_tcp(fds in gen::valid_fds()) {
        let tcp_only = fds.iter().copied().filter(|fd| *fd == Fd::Tcp).collect::<Vec<_>>();

        let mixed = partition(wrap(gen::inherited(&gen::open_all(&fds)))).unwrap();
        let pure = partition(wrap(gen::inherited(&gen::open_all(&tcp_only)))).unwrap();

        prop_assert_eq!(mixed.plain.len(), pure.plain.len());
        prop_assert_eq!(mixed.rpc.len(), pure.rpc.len());
    }

    #[test]
    fn any_error_yields_no_groups(fds in gen::fds()) {
        let opened = gen::open_all(&fds);
        let res = partition(wrap(gen::inherited(&opened)));
        match fds.iter().position(|fd| *fd == Fd::Invalid) {
            Some(i) => {
                let expected = format!("sock-{}", i);
                let aborted =
                    matches!(&res, Err(Error::Socket { name, .. }) if *name == expected);
                prop_assert!(aborted, "expected error at {}, got {:?}", expected, res)
            },
            None => prop_assert!(res.is_ok()),
        }
        drop(res);
        gen::close_invalid(&opened);
    }
}
