// Copyright © 2022 The Radicle Link Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use std::net::{SocketAddr, TcpListener};

use link_activation::{
    merge,
    partition,
    partition_with,
    socket::wrap,
    Error,
    Groups,
    Policy,
    Roles,
};
use pretty_assertions::assert_eq;

use crate::gen::{self, Fd, Opened};

fn addrs(listeners: &[TcpListener]) -> Vec<SocketAddr> {
    listeners.iter().map(|l| l.local_addr().unwrap()).collect()
}

fn partitioned(fds: &[Fd]) -> (Vec<Opened>, Groups) {
    let opened = gen::open_all(fds);
    let groups = partition(wrap(gen::inherited(&opened))).unwrap();
    (opened, groups)
}

#[test]
fn no_tcp() {
    let (_, groups) = partitioned(&[]);
    assert!(groups.plain.is_empty());
    assert!(groups.rpc.is_empty());
    assert!(groups.udp.is_empty());
}

#[test]
fn one_tcp_is_plain() {
    let (opened, groups) = partitioned(&[Fd::Tcp]);
    let tcp = gen::tcp_addrs(&opened);
    assert_eq!(addrs(&groups.plain), tcp);
    assert!(groups.rpc.is_empty());
}

#[test]
fn second_tcp_is_rpc() {
    let (opened, groups) = partitioned(&[Fd::Tcp, Fd::Tcp]);
    let tcp = gen::tcp_addrs(&opened);
    assert_eq!(addrs(&groups.plain), vec![tcp[0]]);
    assert_eq!(addrs(&groups.rpc), vec![tcp[1]]);
}

#[test]
fn third_tcp_is_plain() {
    let (opened, groups) = partitioned(&[Fd::Tcp, Fd::Tcp, Fd::Tcp]);
    let tcp = gen::tcp_addrs(&opened);
    assert_eq!(addrs(&groups.plain), vec![tcp[0], tcp[2]]);
    assert_eq!(addrs(&groups.rpc), vec![tcp[1]]);
}

#[test]
fn fourth_tcp_is_plain() {
    let (opened, groups) = partitioned(&[Fd::Tcp, Fd::Tcp, Fd::Tcp, Fd::Tcp]);
    let tcp = gen::tcp_addrs(&opened);
    assert_eq!(addrs(&groups.plain), vec![tcp[0], tcp[2], tcp[3]]);
    assert_eq!(addrs(&groups.rpc), vec![tcp[1]]);
}

#[test]
fn udp_does_not_shift_tcp() {
    let (opened, groups) = partitioned(&[Fd::Udp, Fd::Tcp, Fd::Udp, Fd::Udp, Fd::Tcp, Fd::Tcp]);
    let tcp = gen::tcp_addrs(&opened);
    assert_eq!(addrs(&groups.plain), vec![tcp[0], tcp[2]]);
    assert_eq!(addrs(&groups.rpc), vec![tcp[1]]);
    assert_eq!(
        groups
            .udp
            .iter()
            .map(|s| s.local_addr().unwrap())
            .collect::<Vec<_>>(),
        gen::udp_addrs(&opened)
    );
}

#[test]
fn error_aborts() {
    let opened = gen::open_all(&[Fd::Tcp, Fd::Udp, Fd::Invalid, Fd::Tcp]);
    let res = partition(wrap(gen::inherited(&opened)));
    assert_matches!(res, Err(Error::Socket { name, .. }) => assert_eq!(name, "sock-2"));
    gen::close_invalid(&opened);
}

#[test]
fn first_error_wins() {
    let opened = gen::open_all(&[Fd::Invalid, Fd::Tcp, Fd::Invalid]);
    let res = partition(wrap(gen::inherited(&opened)));
    assert_matches!(res, Err(Error::Socket { name, .. }) => assert_eq!(name, "sock-0"));
    gen::close_invalid(&opened);
}

#[test]
fn degrade_skips_errors() {
    let opened = gen::open_all(&[Fd::Tcp, Fd::Invalid, Fd::Tcp, Fd::Udp]);
    let groups = partition_with(
        wrap(gen::inherited(&opened)),
        Policy::Degrade,
        &Roles::Positional,
    )
    .unwrap();
    let tcp = gen::tcp_addrs(&opened);

    assert_eq!(addrs(&groups.plain), vec![tcp[0]]);
    assert_eq!(addrs(&groups.rpc), vec![tcp[1]]);
    assert_eq!(groups.udp.len(), 1);
    assert_eq!(groups.rejected.len(), 1);
    assert_matches!(&groups.rejected[0], Error::Socket { name, .. } => assert_eq!(name, "sock-1"));
    gen::close_invalid(&opened);
}

#[test]
fn named_roles() {
    let opened = gen::open_all(&[Fd::Tcp, Fd::Tcp, Fd::Tcp, Fd::Udp]);
    let groups = partition_with(
        wrap(gen::inherited(&opened)),
        Policy::FailFast,
        &Roles::named(["sock-0", "sock-2"]),
    )
    .unwrap();
    let tcp = gen::tcp_addrs(&opened);

    assert_eq!(addrs(&groups.plain), vec![tcp[1]]);
    assert_eq!(addrs(&groups.rpc), vec![tcp[0], tcp[2]]);
}

#[test]
fn merge_keeps_order() {
    let opened = gen::open_all(&[Fd::Tcp, Fd::Udp, Fd::Tcp, Fd::Tcp]);
    let merged = merge(wrap(gen::inherited(&opened))).unwrap();
    assert_eq!(addrs(&merged.tcp), gen::tcp_addrs(&opened));
    assert_eq!(merged.udp.len(), 1);
}

#[test]
fn merge_error_aborts() {
    let opened = gen::open_all(&[Fd::Tcp, Fd::Invalid]);
    assert_matches!(
        merge(wrap(gen::inherited(&opened))),
        Err(Error::Socket { name, .. }) => assert_eq!(name, "sock-1")
    );
    gen::close_invalid(&opened);
}
