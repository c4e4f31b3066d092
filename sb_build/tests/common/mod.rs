// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use sb_build::layout::{Layout, Tools};
use sb_build::matrix::Matrix;
use sb_build::plan;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

const OTPTOOL: &str = r#"#!/bin/sh
set -e
[ "$1" = make_otp_image ] || exit 1
while [ $# -gt 0 ]; do
    case "$1" in
        --output_folder) out="$2"; shift ;;
    esac
    shift
done
echo otp > "$out/otp-all.image"
"#;

const SOCSEC: &str = r#"#!/bin/sh
set -e
cmd="$1"
shift
while [ $# -gt 0 ]; do
    case "$1" in
        --bl1_image) in="$2"; shift ;;
        --output) out="$2"; shift ;;
        --sec_image) sec="$2"; shift ;;
        --otp_image) otp="$2"; shift ;;
    esac
    shift
done
case "$cmd" in
    make_secure_bl1_image)
        cat "$in" > "$out"
        echo signed >> "$out"
        ;;
    verify)
        case "$sec" in
            *"${FAIL_VERIFY:-//none//}"*)
                echo "signature mismatch in $sec" >&2
                exit 2
                ;;
        esac
        [ -f "$sec" ] && [ -f "$otp" ]
        echo "$sec: OK" >> "$(dirname "$sec")/verify.log"
        ;;
    *)
        exit 1
        ;;
esac
"#;

const UART: &str = r#"#!/bin/sh
set -e
cat "$1" > "$2"
echo uart >> "$2"
"#;

fn write_executable(path: &Path, contents: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

/// Populates `root` with every input the stock matrix reads plus fake
/// tools, and returns a layout pointing at them.
pub fn stub_root(root: &Path) -> Layout {
    let tools = Tools {
        otptool: root.join("bin/otptool"),
        socsec: root.join("bin/socsec"),
    };
    write_executable(&tools.otptool, OTPTOOL);
    write_executable(&tools.socsec, SOCSEC);

    let layout = Layout::new(root, tools);
    write_executable(&layout.uart_script(), UART);

    for input in plan::inputs(&layout, &Matrix::ast1030().unwrap()) {
        if !input.exists() {
            std::fs::create_dir_all(input.parent().unwrap()).unwrap();
            std::fs::write(&input, b"fake").unwrap();
        }
    }
    std::fs::write(layout.image(), b"zephyr\n").unwrap();
    layout
}
