// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn marked_host_stays_marked_until_reset() {
    let set = StickyFailureSet::new();
    let host = HostId::new();
    assert!(!set.is_marked(host));
    set.mark(host);
    assert!(set.is_marked(host));
    set.reset();
    assert!(!set.is_marked(host));
}
