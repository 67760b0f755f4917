// Copyright © 2022 The Radicle Link Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use link_activation::{
    socket::{find, wrap},
    Kind,
};
use proptest::prelude::*;

use crate::gen;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn classification_is_positional(fds in gen::fds()) {
        let opened = gen::open_all(&fds);
        let wrapped = wrap(gen::inherited(&opened));

        prop_assert_eq!(wrapped.len(), fds.len());
        for (w, fd) in wrapped.iter().zip(&fds) {
            prop_assert_eq!(w.kind(), fd.kind());
        }
        drop(wrapped);
        gen::close_invalid(&opened);
    }

    #[test]
    fn find_enumerates_matches(fds in gen::fds(), udp in any::<bool>()) {
        let kind = if udp { Kind::Udp } else { Kind::Tcp };
        let opened = gen::open_all(&fds);
        let wrapped = wrap(gen::inherited(&opened));

        let mut found = Vec::new();
        let mut next = find(&wrapped, 0, kind);
        while let Some(i) = next {
            found.push(i);
            next = find(&wrapped, i + 1, kind);
        }
        let expected = fds
            .iter()
            .enumerate()
            .filter(|(_, fd)| fd.kind() == Some(kind))
            .map(|(i, _)| i)
            .collect::<Vec<_>>();

        prop_assert_eq!(found, expected);
        drop(wrapped);
        gen::close_invalid(&opened);
    }
}
