//! Root key → functional category table

/// Display information for one recognized root key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryInfo {
    pub root: &'static str,
    pub display_name: &'static str,
    pub rank: u32,
}

const fn category(root: &'static str, display_name: &'static str, rank: u32) -> CategoryInfo {
    CategoryInfo {
        root,
        display_name,
        rank,
    }
}

/// Known sing-box root keys in display order
pub const REGISTRY: [CategoryInfo; 9] = [
    category("log", "日志", 1),
    category("experimental", "实验性", 2),
    category("dns", "DNS", 3),
    category("inbounds", "入站", 4),
    category("outbounds", "出站", 5),
    category("route", "路由规则", 6),
    category("ntp", "NTP", 7),
    category("fakedns", "FakeDNS", 8),
    category("warp", "WARP", 9),
];

/// Rank given to files without a recognized root
pub const UNMATCHED_RANK: u32 = REGISTRY.len() as u32 + 1;

pub fn lookup(root: &str) -> Option<&'static CategoryInfo> {
    REGISTRY.iter().find(|info| info.root == root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_and_unknown() {
        assert_eq!(lookup("dns").map(|c| c.rank), Some(3));
        assert_eq!(lookup("outbounds").map(|c| c.display_name), Some("出站"));
        assert!(lookup("Log").is_none());
        assert!(lookup("services").is_none());
    }

    #[test]
    fn test_ranks_unique_and_below_unmatched() {
        let mut ranks: Vec<u32> = REGISTRY.iter().map(|c| c.rank).collect();
        ranks.dedup();
        assert_eq!(ranks.len(), REGISTRY.len());
        assert!(ranks.iter().all(|&r| r < UNMATCHED_RANK));
    }
}
