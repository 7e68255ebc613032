//! Rule model shared by every rule-collection resource
//!
//! A rule is one remote side-effect unit attached to a parent resource (a
//! port forward on a public IP, an entry in a network ACL). Rules are
//! identified by their [`Rule::Key`], never by their remote id.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt::Debug;
use std::hash::Hash;

/// One declarative unit of remote configuration
pub trait Rule: Clone + Debug + Send + Sync + 'static {
    /// Identifying fields, compared for equality and deduplication
    type Key: Clone + Debug + Eq + Hash + Send + Sync;

    fn key(&self) -> Self::Key;

    /// Remote id, empty when the rule does not exist remotely
    fn remote_id(&self) -> &str;

    fn set_remote_id(&mut self, id: String);

    /// Short description used in logs and error messages
    fn describe(&self) -> String {
        format!("{:?}", self.key())
    }

    /// Combine a previously known rule with what the API reports for it.
    ///
    /// The default takes the remote view as is. Rules with optional fields the
    /// API always fills in override this to keep the configured shape.
    fn refresh(&self, remote: Self) -> Self {
        remote
    }

    fn is_created(&self) -> bool {
        !self.remote_id().is_empty()
    }
}

/// Unordered set of rules keyed by their identifying fields
#[derive(Debug, Clone)]
pub struct RuleSet<R: Rule> {
    rules: HashMap<R::Key, R>,
}

impl<R: Rule> Default for RuleSet<R> {
    fn default() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }
}

impl<R: Rule> RuleSet<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a rule. When a rule with the same key is already present, the
    /// one carrying a remote id wins, so a key never maps to two remote rules.
    pub fn insert(&mut self, rule: R) {
        match self.rules.entry(rule.key()) {
            Entry::Vacant(slot) => {
                slot.insert(rule);
            }
            Entry::Occupied(mut slot) => {
                if !slot.get().is_created() || rule.is_created() {
                    slot.insert(rule);
                }
            }
        }
    }

    pub fn remove(&mut self, key: &R::Key) -> Option<R> {
        self.rules.remove(key)
    }

    pub fn get(&self, key: &R::Key) -> Option<&R> {
        self.rules.get(key)
    }

    pub fn contains(&self, key: &R::Key) -> bool {
        self.rules.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &R> {
        self.rules.values()
    }

    /// Rules of `self` whose key is not in `other`
    pub fn difference(&self, other: &RuleSet<R>) -> RuleSet<R> {
        self.rules
            .iter()
            .filter(|(k, _)| !other.contains(k))
            .map(|(_, r)| r.clone())
            .collect()
    }

    /// Rules of `self` whose key is also in `other`
    pub fn intersection(&self, other: &RuleSet<R>) -> RuleSet<R> {
        self.rules
            .iter()
            .filter(|(k, _)| other.contains(k))
            .map(|(_, r)| r.clone())
            .collect()
    }

    pub fn extend(&mut self, rules: impl IntoIterator<Item = R>) {
        for rule in rules {
            self.insert(rule);
        }
    }

    /// Rules sorted by remote id, then by description, for stable output
    pub fn into_sorted_vec(self) -> Vec<R> {
        let mut rules: Vec<R> = self.rules.into_values().collect();
        rules.sort_by_cached_key(|r| (r.remote_id().to_string(), r.describe()));
        rules
    }
}

impl<R: Rule> FromIterator<R> for RuleSet<R> {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        let mut set = RuleSet::new();
        set.extend(iter);
        set
    }
}

impl<R: Rule> IntoIterator for RuleSet<R> {
    type Item = R;
    type IntoIter = std::collections::hash_map::IntoValues<R::Key, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.into_values()
    }
}

/// Rebuild the observed collection from the rules in prior state and the
/// rules the API currently lists for the parent.
///
/// Prior rules with a remote id are matched by id; rules whose id is no longer
/// listed are dropped so the next reconcile recreates them. Prior rules
/// without an id are matched by key. With `managed`, remote rules nobody
/// claimed are adopted, which makes the reconciler delete them.
pub fn observe<R: Rule>(prior: &RuleSet<R>, remote: Vec<R>, managed: bool) -> RuleSet<R> {
    let mut by_id: HashMap<String, R> = remote
        .into_iter()
        .filter(|r| r.is_created())
        .map(|r| (r.remote_id().to_string(), r))
        .collect();

    let mut observed = RuleSet::new();
    let mut unmatched = Vec::new();

    for rule in prior.iter() {
        if !rule.is_created() {
            unmatched.push(rule);
            continue;
        }
        match by_id.remove(rule.remote_id()) {
            Some(found) => observed.insert(rule.refresh(found)),
            None => {
                tracing::debug!(
                    rule = %rule.describe(),
                    id = rule.remote_id(),
                    "rule no longer exists remotely"
                );
            }
        }
    }

    for rule in unmatched {
        let key = rule.key();
        let found = by_id
            .iter()
            .find(|(_, r)| rule.refresh((*r).clone()).key() == key)
            .map(|(id, _)| id.clone());
        if let Some(remote) = found.and_then(|id| by_id.remove(&id)) {
            observed.insert(rule.refresh(remote));
        }
    }

    if managed {
        for (_, rule) in by_id {
            tracing::debug!(rule = %rule.describe(), "adopting unmanaged remote rule");
            observed.insert(rule);
        }
    }

    observed
}
