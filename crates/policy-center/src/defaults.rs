use std::collections::BTreeMap;

use refgate_tag_query::{QUERY_MAX_LEN, SEARCH_MAX_LEN};

use crate::model::AuthConfig;

pub const DEFAULT_ROLE_CHAIN: &str = "SYSADMIN > ADMIN > MOD > EDITOR > USER > VIEWER > ANONYMOUS";

pub fn default_config() -> AuthConfig {
    AuthConfig {
        local_origin: String::new(),
        role_hierarchy: vec![DEFAULT_ROLE_CHAIN.to_string()],
        max_query_len: QUERY_MAX_LEN,
        max_search_len: SEARCH_MAX_LEN,
        provenance: BTreeMap::new(),
    }
}
