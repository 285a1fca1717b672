//! Consolidated timing reports and text rendering of the trail.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt::{self, Write};

use crate::error::ArtifactResult;
use crate::node::NodeId;
use crate::trail::{ArtifactExecutionTrail, completed_total};
use crate::types::{ArtifactType, AuthzAction};

/// Identity of an artifact across invocations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArtifactKey {
    /// Artifact name.
    pub name: String,
    /// Artifact type.
    pub artifact_type: ArtifactType,
}

/// Aggregated timing of every invocation of one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactStats {
    /// Artifact name.
    pub name: String,
    /// Artifact type.
    pub artifact_type: ArtifactType,
    /// Number of invocations.
    pub count: u64,
    /// Summed own time.
    pub own_time_nanos: u64,
    /// Summed total time. Recursive invocations are counted at every level.
    pub total_time_nanos: u64,
}

impl ArtifactStats {
    fn new(key: ArtifactKey) -> Self {
        Self {
            name: key.name,
            artifact_type: key.artifact_type,
            count: 0,
            own_time_nanos: 0,
            total_time_nanos: 0,
        }
    }

    fn add(&mut self, own: u64, total: u64) {
        self.count = self.count.saturating_add(1);
        self.own_time_nanos = self.own_time_nanos.saturating_add(own);
        self.total_time_nanos = self.total_time_nanos.saturating_add(total);
    }
}

/// Call tree with repeated sibling invocations merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedNode {
    /// Artifact name.
    pub name: String,
    /// Artifact type.
    pub artifact_type: ArtifactType,
    /// Action of the first merged invocation.
    pub action: Option<AuthzAction>,
    /// Number of merged invocations.
    pub count: u64,
    /// Summed own time.
    pub own_time_nanos: u64,
    /// Summed total time.
    pub total_time_nanos: u64,
    /// Merged callees, in first-call order.
    pub children: Vec<ConsolidatedNode>,
}

/// Flat and nested aggregation of completed artifact trees.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConsolidatedReport {
    /// One entry per artifact, hottest own time first.
    pub flat: Vec<ArtifactStats>,
    /// Merged call trees, one per distinct root artifact.
    pub tree: Vec<ConsolidatedNode>,
}

impl ConsolidatedReport {
    /// Stats for one artifact.
    #[must_use]
    pub fn stats(&self, name: &str, artifact_type: ArtifactType) -> Option<&ArtifactStats> {
        self.flat
            .iter()
            .find(|s| s.name == name && s.artifact_type == artifact_type)
    }

    /// Sum of own time over all artifacts, which equals the summed total of
    /// the consolidated roots.
    #[must_use]
    pub fn total_own_time_nanos(&self) -> u64 {
        self.flat
            .iter()
            .fold(0u64, |acc, s| acc.saturating_add(s.own_time_nanos))
    }
}

fn hottest_first(a: &ArtifactStats, b: &ArtifactStats) -> Ordering {
    b.own_time_nanos
        .cmp(&a.own_time_nanos)
        .then_with(|| b.total_time_nanos.cmp(&a.total_time_nanos))
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.artifact_type.cmp(&b.artifact_type))
}

impl ArtifactExecutionTrail {
    /// Aggregate the trees under `roots`.
    ///
    /// # Errors
    ///
    /// [`ArtifactError::UnknownNode`](crate::ArtifactError::UnknownNode) or
    /// [`ArtifactError::NotCompleted`](crate::ArtifactError::NotCompleted) if
    /// any node under `roots` is still running.
    pub fn consolidate(&self, roots: &[NodeId]) -> ArtifactResult<ConsolidatedReport> {
        let mut by_key: HashMap<ArtifactKey, ArtifactStats> = HashMap::new();
        let mut tree = Vec::new();
        for &root in roots {
            self.consolidate_into(root, &mut tree, &mut by_key)?;
        }

        let mut flat: Vec<ArtifactStats> = by_key.into_values().collect();
        flat.sort_by(hottest_first);
        Ok(ConsolidatedReport { flat, tree })
    }

    /// Aggregate every completed root tree retained by the trail.
    ///
    /// # Errors
    ///
    /// Same as [`consolidate`](Self::consolidate).
    pub fn consolidate_completed(&self) -> ArtifactResult<ConsolidatedReport> {
        self.consolidate(&self.completed_roots())
    }

    fn consolidate_into(
        &self,
        id: NodeId,
        siblings: &mut Vec<ConsolidatedNode>,
        by_key: &mut HashMap<ArtifactKey, ArtifactStats>,
    ) -> ArtifactResult<()> {
        let node = self.node(id)?;
        let total = completed_total(node)?;
        let own = self.own_time_nanos(id)?;

        let key = ArtifactKey {
            name: node.name().to_string(),
            artifact_type: node.artifact_type(),
        };
        by_key
            .entry(key.clone())
            .or_insert_with(|| ArtifactStats::new(key))
            .add(own, total);

        let index = match siblings
            .iter()
            .position(|s| s.name == node.name() && s.artifact_type == node.artifact_type())
        {
            Some(index) => index,
            None => {
                siblings.push(ConsolidatedNode {
                    name: node.name().to_string(),
                    artifact_type: node.artifact_type(),
                    action: node.action(),
                    count: 0,
                    own_time_nanos: 0,
                    total_time_nanos: 0,
                    children: Vec::new(),
                });
                siblings.len().saturating_sub(1)
            }
        };
        let merged = &mut siblings[index];
        merged.count = merged.count.saturating_add(1);
        merged.own_time_nanos = merged.own_time_nanos.saturating_add(own);
        merged.total_time_nanos = merged.total_time_nanos.saturating_add(total);

        for &child in node.children() {
            self.consolidate_into(child, &mut merged.children, by_key)?;
        }
        Ok(())
    }

    /// Write an indented line for `id`, and with `children` its whole
    /// subtree, to `writer`.
    ///
    /// Each line shows running time and own time in milliseconds, percent of
    /// the parent's time, artifact type, action and name. Running nodes print
    /// `running` in place of their times. Unknown IDs print nothing.
    ///
    /// # Errors
    ///
    /// Only errors from `writer`.
    pub fn print<W: Write>(
        &self,
        writer: &mut W,
        id: NodeId,
        level: usize,
        children: bool,
    ) -> fmt::Result {
        let Ok(node) = self.node(id) else {
            return Ok(());
        };

        write!(writer, "{:indent$}", "", indent = level.saturating_mul(2))?;
        match (node.total_running_time_nanos(), self.own_time_nanos(id)) {
            (Some(total), Ok(own)) => {
                write!(writer, "[{:>10.3}:{:>10.3}]", millis(total), millis(own))?;
            }
            (Some(total), Err(_)) => {
                write!(writer, "[{:>10.3}:{:>10}]", millis(total), "-")?;
            }
            (None, _) => write!(writer, "[{:>21}]", "running")?,
        }
        match self.percent_of_parent_time(id) {
            Ok(Some(pct)) => write!(writer, " {pct:>5.1}%")?,
            _ => write!(writer, " {:>6}", "")?,
        }
        write!(writer, " {}", node.artifact_type().description())?;
        if let Some(action) = node.action() {
            write!(writer, " {}", action.description())?;
        }
        writeln!(writer, " {}", node.name())?;

        if children {
            let level = level.saturating_add(1);
            for &child in node.children() {
                self.print(writer, child, level, true)?;
            }
        }
        Ok(())
    }

    /// Render every retained tree.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for &root in self.roots() {
            // Writing to a String cannot fail.
            let _ = self.print(&mut out, root, 0, true);
        }
        out
    }
}

#[allow(clippy::cast_precision_loss)]
fn millis(nanos: u64) -> f64 {
    nanos as f64 / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::Arc;
    use std::time::Duration;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    /// page(find x2 -> entity, render)
    fn sample() -> (ArtifactExecutionTrail, NodeId) {
        let clock = ManualClock::new();
        let mut trail = ArtifactExecutionTrail::with_clock(Arc::new(clock.clone()));
        let page = trail.push("page", ArtifactType::Screen, Some(AuthzAction::View));
        for _ in 0..2 {
            trail.push("find", ArtifactType::Service, Some(AuthzAction::View));
            clock.advance(ms(1));
            trail.push("Item", ArtifactType::Entity, Some(AuthzAction::View));
            clock.advance(ms(4));
            trail.pop().unwrap();
            trail.pop().unwrap();
        }
        trail.push("render", ArtifactType::Other, None);
        clock.advance(ms(3));
        trail.pop().unwrap();
        clock.advance(ms(2));
        trail.pop().unwrap();
        (trail, page)
    }

    #[test]
    fn test_flat_stats_sorted_by_own_time() {
        let (trail, page) = sample();
        let report = trail.consolidate(&[page]).unwrap();

        let names: Vec<&str> = report.flat.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Item", "render", "page", "find"]);

        let item = report.stats("Item", ArtifactType::Entity).unwrap();
        assert_eq!(item.count, 2);
        assert_eq!(item.own_time_nanos, 8_000_000);
        let find = report.stats("find", ArtifactType::Service).unwrap();
        assert_eq!(find.own_time_nanos, 2_000_000);
        assert_eq!(find.total_time_nanos, 10_000_000);

        assert_eq!(
            report.total_own_time_nanos(),
            trail.node(page).unwrap().total_running_time_nanos().unwrap()
        );
    }

    #[test]
    fn test_stats_sum_across_completed_trees() {
        let clock = ManualClock::new();
        let mut trail = ArtifactExecutionTrail::with_clock(Arc::new(clock.clone()));
        for i in 1..=3 {
            trail.push("request", ArtifactType::Screen, None);
            trail.push("order.get", ArtifactType::Service, Some(AuthzAction::View));
            clock.advance(ms(i));
            trail.push("order.validate", ArtifactType::Service, None);
            clock.advance(ms(2));
            trail.pop().unwrap();
            trail.pop().unwrap();
            trail.push("Order", ArtifactType::Entity, Some(AuthzAction::View));
            clock.advance(ms(3));
            trail.pop().unwrap();
            clock.advance(ms(1));
            trail.pop().unwrap();
        }

        let roots = trail.completed_roots();
        assert_eq!(roots.len(), 3);
        let report = trail.consolidate_completed().unwrap();

        for (name, artifact_type, own_ms) in [
            ("request", ArtifactType::Screen, 3),
            ("order.get", ArtifactType::Service, 6),
            ("order.validate", ArtifactType::Service, 6),
            ("Order", ArtifactType::Entity, 9),
        ] {
            let stats = report.stats(name, artifact_type).unwrap();
            assert_eq!(stats.count, 3, "{name}");
            assert_eq!(u128::from(stats.own_time_nanos), ms(own_ms).as_nanos(), "{name}");
        }
        assert!(report.stats("Order", ArtifactType::Service).is_none());

        let root_total: u64 = roots
            .iter()
            .map(|&root| trail.node(root).unwrap().total_running_time_nanos().unwrap())
            .sum();
        assert_eq!(root_total, 24_000_000);
        assert_eq!(report.total_own_time_nanos(), root_total);
    }

    #[test]
    fn test_flat_ties_break_on_total_then_name() {
        let clock = ManualClock::new();
        let mut trail = ArtifactExecutionTrail::with_clock(Arc::new(clock.clone()));
        let root = trail.push("root", ArtifactType::Screen, None);
        for name in ["b", "a"] {
            trail.push(name, ArtifactType::Service, None);
            clock.advance(ms(1));
            trail.pop().unwrap();
        }
        trail.pop().unwrap();

        let report = trail.consolidate(&[root]).unwrap();
        let names: Vec<&str> = report.flat.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "root"]);
    }

    #[test]
    fn test_tree_merges_repeated_siblings() {
        let (trail, page) = sample();
        let report = trail.consolidate(&[page]).unwrap();

        assert_eq!(report.tree.len(), 1);
        let page = &report.tree[0];
        assert_eq!(page.children.len(), 2);
        let find = &page.children[0];
        assert_eq!(find.name, "find");
        assert_eq!(find.count, 2);
        assert_eq!(find.children.len(), 1);
        assert_eq!(find.children[0].count, 2);
        assert_eq!(find.children[0].total_time_nanos, 8_000_000);
        assert_eq!(page.children[1].name, "render");
    }

    #[test]
    fn test_consolidate_rejects_running_tree() {
        let mut trail = ArtifactExecutionTrail::new();
        let root = trail.push("open", ArtifactType::Screen, None);
        assert!(trail.consolidate(&[root]).is_err());
        assert!(trail.consolidate_completed().unwrap().flat.is_empty());
    }

    #[test]
    fn test_report_serializes() {
        let (trail, _page) = sample();
        let report = trail.consolidate_completed().unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["tree"][0]["name"], "page");
        assert_eq!(json["flat"][0]["artifact_type"], "entity");

        let back: ConsolidatedReport = serde_json::from_value(json).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn test_print_renders_indented_tree() {
        let (trail, page) = sample();
        let mut out = String::new();
        trail.print(&mut out, page, 0, true).unwrap();

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[0].starts_with("[    15.000:     2.000]"));
        assert!(lines[0].ends_with("Screen View page"));
        assert!(lines[1].starts_with("  ["));
        assert!(lines[1].contains("33.3%"));
        assert!(lines[2].starts_with("    ["));
        assert!(lines[2].ends_with("Entity View Item"));
        assert!(lines[5].ends_with("Other render"));

        let mut single = String::new();
        trail.print(&mut single, page, 1, false).unwrap();
        assert_eq!(single.lines().count(), 1);
        assert!(single.starts_with("  ["));
    }

    #[test]
    fn test_render_shows_running_nodes() {
        let mut trail = ArtifactExecutionTrail::new();
        trail.push("open", ArtifactType::RestPath, None);
        let out = trail.render();
        assert!(out.contains("running"));
        assert!(out.contains("REST Path open"));
    }
}
