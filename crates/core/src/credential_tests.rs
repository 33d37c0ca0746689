// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn debug_never_prints_the_secret() {
    let cred = Credential::password("admin", "hunter2").with_privilege_escalation("sudopw");
    let rendered = format!("{:?}", cred);
    assert!(!rendered.contains("hunter2"));
    assert!(!rendered.contains("sudopw"));
    assert!(rendered.contains("admin"));
}

#[test]
fn private_key_secret_is_also_redacted() {
    let cred = Credential::private_key("deploy", "-----BEGIN KEY-----secret-----END KEY-----");
    let rendered = format!("{:?}", cred);
    assert!(!rendered.contains("secret"));
}
