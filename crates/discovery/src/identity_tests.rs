// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn same_external_id_resolves_to_the_same_host_id() {
    let registry = HostIdentityRegistry::new();
    let a = registry.resolve_or_mint("CN=WS01,OU=Workstations,DC=example,DC=local");
    let b = registry.resolve_or_mint("CN=WS01,OU=Workstations,DC=example,DC=local");
    assert_eq!(a, b);
}

#[test]
fn distinct_external_ids_mint_distinct_host_ids() {
    let registry = HostIdentityRegistry::new();
    let a = registry.resolve_or_mint("CN=WS01,DC=example,DC=local");
    let b = registry.resolve_or_mint("CN=WS02,DC=example,DC=local");
    assert_ne!(a, b);
}
