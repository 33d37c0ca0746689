// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn displays_as_the_bare_id() {
    let id = RunbookId::from("RB-WIN-SEC-001");
    assert_eq!(id.to_string(), "RB-WIN-SEC-001");
}
