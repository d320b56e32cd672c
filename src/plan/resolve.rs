//! Priority resolution across competing plan entries
//!
//! Several entries may ask for the same dependency with different versions.
//! Exactly one wins, chosen by the rank of its version source; ties go to
//! the entry that appears first. Launch and build flags are not taken from
//! the winner: they are OR-ed over every entry.

use crate::plan::entry::{PlanEntry, VersionSource};

/// Rank given to entries whose source is missing or not in the table
const UNRANKED: i32 = -1;

/// Source tag -> rank (higher wins)
#[derive(Debug, Clone)]
pub struct Priorities {
    ranks: Vec<(VersionSource, i32)>,
}

impl Priorities {
    /// Build a table from explicit ranks
    pub fn new(ranks: impl IntoIterator<Item = (VersionSource, i32)>) -> Self {
        Self {
            ranks: ranks.into_iter().collect(),
        }
    }

    /// Rank of an entry's source
    pub fn rank(&self, source: Option<&VersionSource>) -> i32 {
        source
            .and_then(|s| self.ranks.iter().find(|(known, _)| known == s))
            .map(|(_, rank)| *rank)
            .unwrap_or(UNRANKED)
    }
}

impl Default for Priorities {
    /// `BP_NGINX_VERSION` > `buildpack.yml` > `buildpack.toml`
    fn default() -> Self {
        Self::new([
            (VersionSource::BpEnvVar, 3),
            (VersionSource::BuildpackYml, 2),
            (VersionSource::BuildpackToml, 1),
        ])
    }
}

/// Outcome of resolving one dependency's entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Highest-ranked entry
    pub chosen: PlanEntry,

    /// All matching entries, best first
    pub ranked: Vec<PlanEntry>,

    /// Any entry requested launch
    pub launch: bool,

    /// Any entry requested build
    pub build: bool,
}

/// Pick the winning entry for `name`.
///
/// Returns `None` only when no entry carries that name.
pub fn resolve(name: &str, entries: &[PlanEntry], priorities: &Priorities) -> Option<Resolution> {
    let mut ranked: Vec<PlanEntry> = entries.iter().filter(|e| e.name == name).cloned().collect();

    // sort_by_key is stable, so equal ranks keep input order
    ranked.sort_by_key(|e| std::cmp::Reverse(priorities.rank(e.version_source())));

    let chosen = ranked.first()?.clone();
    let launch = ranked.iter().any(|e| e.metadata.launch);
    let build = ranked.iter().any(|e| e.metadata.build);

    Some(Resolution {
        chosen,
        ranked,
        launch,
        build,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(version: &str, source: VersionSource) -> PlanEntry {
        PlanEntry::new("nginx").with_version(version, source)
    }

    #[test]
    fn env_var_beats_everything() {
        let entries = vec![
            entry("1.24.*", VersionSource::BuildpackToml),
            entry("1.23.*", VersionSource::BuildpackYml),
            entry("1.25.3", VersionSource::BpEnvVar),
        ];

        let res = resolve("nginx", &entries, &Priorities::default()).unwrap();
        assert_eq!(res.chosen.requested_version(), Some("1.25.3"));
        let order: Vec<_> = res.ranked.iter().filter_map(|e| e.requested_version()).collect();
        assert_eq!(order, vec!["1.25.3", "1.23.*", "1.24.*"]);
    }

    #[test]
    fn ties_go_to_first_occurrence() {
        let entries = vec![
            entry("1.24.*", VersionSource::BuildpackYml),
            entry("1.25.*", VersionSource::BuildpackYml),
        ];

        let res = resolve("nginx", &entries, &Priorities::default()).unwrap();
        assert_eq!(res.chosen.requested_version(), Some("1.24.*"));
    }

    #[test]
    fn unknown_source_ranks_lowest_but_can_win_alone() {
        let unknown = entry("1.22.*", VersionSource::Unknown("package.json".to_string()));

        let res = resolve("nginx", &[unknown.clone()], &Priorities::default()).unwrap();
        assert_eq!(res.chosen, unknown);

        let entries = vec![unknown, entry("1.24.*", VersionSource::BuildpackToml)];
        let res = resolve("nginx", &entries, &Priorities::default()).unwrap();
        assert_eq!(res.chosen.requested_version(), Some("1.24.*"));
    }

    #[test]
    fn flags_are_or_combined_independent_of_winner() {
        let entries = vec![
            entry("1.25.3", VersionSource::BpEnvVar),
            PlanEntry::new("nginx").with_launch(true),
            entry("1.24.*", VersionSource::BuildpackToml).with_build(true),
        ];

        let res = resolve("nginx", &entries, &Priorities::default()).unwrap();
        assert_eq!(res.chosen.requested_version(), Some("1.25.3"));
        assert!(!res.chosen.metadata.launch);
        assert!(res.launch);
        assert!(res.build);
    }

    #[test]
    fn entry_without_metadata_is_eligible() {
        let res = resolve("nginx", &[PlanEntry::new("nginx")], &Priorities::default()).unwrap();
        assert_eq!(res.chosen.requested_version(), None);
        assert!(!res.launch);
        assert!(!res.build);
    }

    #[test]
    fn other_names_ignored() {
        let entries = vec![
            PlanEntry::new("watchexec").with_launch(true),
            entry("1.24.*", VersionSource::BuildpackToml),
        ];

        let res = resolve("nginx", &entries, &Priorities::default()).unwrap();
        assert_eq!(res.ranked.len(), 1);
        assert!(!res.launch);
        assert!(resolve("httpd", &entries, &Priorities::default()).is_none());
    }

    #[test]
    fn custom_priorities() {
        let priorities = Priorities::new([
            (VersionSource::BuildpackToml, 10),
            (VersionSource::BpEnvVar, 1),
        ]);
        let entries = vec![
            entry("1.25.3", VersionSource::BpEnvVar),
            entry("1.24.*", VersionSource::BuildpackToml),
        ];

        let res = resolve("nginx", &entries, &priorities).unwrap();
        assert_eq!(res.chosen.requested_version(), Some("1.24.*"));
    }
}
