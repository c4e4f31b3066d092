// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![cfg(unix)]

mod common;

use sb_build::layout::KEY_INDICES;
use sb_build::matrix::Matrix;
use sb_build::orchestrator;
use sb_build::runner::ProcessRunner;

#[test]
fn builds_every_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let layout = common::stub_root(dir.path());
    let matrix = Matrix::ast1030().unwrap();

    assert!(orchestrator::preflight(&layout, &matrix).is_empty());

    let report = orchestrator::run_all(&layout, &matrix, &mut ProcessRunner).unwrap();
    assert_eq!(report.commands, 12 * 11);

    let built: Vec<_> = std::fs::read_dir(layout.output_root())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(built.len(), 12);

    for config in &matrix {
        let out = layout.output_dir(config);
        assert_eq!(out, dir.path().join("build/sb_bin").join(config.name()));
        assert!(layout.otp_image(config).is_file());

        for kid in KEY_INDICES {
            let signed = std::fs::read_to_string(layout.signed_image(config, kid)).unwrap();
            assert_eq!(signed, "zephyr\nsigned\n");
            let uart = std::fs::read_to_string(layout.signed_uart_image(config, kid)).unwrap();
            assert_eq!(uart, "zephyr\nsigned\nuart\n");
        }

        let verified = std::fs::read_to_string(out.join("verify.log")).unwrap();
        assert_eq!(verified.lines().count(), 3);
        assert!(verified.lines().all(|l| l.ends_with(": OK")));

        assert_eq!(
            std::fs::read_to_string(layout.plain_image(config)).unwrap(),
            "zephyr\n"
        );
        assert_eq!(
            std::fs::read_to_string(layout.plain_uart_image(config)).unwrap(),
            "zephyr\nuart\n"
        );
    }
}
