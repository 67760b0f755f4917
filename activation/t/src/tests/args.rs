// Copyright © 2022 The Radicle Link Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use clap::Parser as _;
use link_activation::{
    args::{Args, Listen, Mode},
    Policy,
    Roles,
};
use pretty_assertions::assert_eq;

#[test]
fn defaults() {
    let args = Args::try_parse_from(["activation"]).unwrap();
    assert_eq!(args.mode, Mode::H2c);
    assert_eq!(args.roles(), Roles::Positional);
    assert_eq!(args.policy(), Policy::FailFast);
}

#[test]
fn all_flags() {
    let args = Args::try_parse_from([
        "activation",
        "--http-listen",
        "127.0.0.1:8080,127.0.0.1:8081",
        "--grpc-listen",
        "127.0.0.1:50051",
        "--udp-listen",
        "127.0.0.1:5353",
        "--mode",
        "split",
        "--rpc-names",
        "grpc,grpc-admin",
        "--degrade",
    ])
    .unwrap();

    assert_eq!(
        args.http_listen,
        Some(Listen(vec![
            "127.0.0.1:8080".to_owned(),
            "127.0.0.1:8081".to_owned()
        ]))
    );
    assert_eq!(
        args.grpc_listen,
        Some(Listen(vec!["127.0.0.1:50051".to_owned()]))
    );
    assert_eq!(args.udp_listen, Some(Listen(vec!["127.0.0.1:5353".to_owned()])));
    assert_eq!(args.mode, Mode::Split);
    assert_eq!(args.roles(), Roles::named(["grpc", "grpc-admin"]));
    assert_eq!(args.policy(), Policy::Degrade);
}

#[test]
fn unknown_mode() {
    assert!(Args::try_parse_from(["activation", "--mode", "tls"]).is_err());
}

#[test]
fn listen_display_roundtrip() {
    let listen: Listen = "a:1,b:2".parse().unwrap();
    assert_eq!(listen.to_string(), "a:1,b:2");
    assert_eq!("".parse::<Listen>().unwrap(), Listen::default());
}
