use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::logic::label::resolve_label;
use crate::model::{Item, LabeledItem, MergedView};

/// Sparse overrides applied on top of a schema-derived item list.
/// `None` means "never configured" and leaves the list as it is.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListOverrides<'a> {
    pub hidden: Option<&'a BTreeSet<String>>,
    pub order: Option<&'a [String]>,
    pub labels: Option<&'a BTreeMap<String, String>>,
}

impl<'a> ListOverrides<'a> {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn hidden(mut self, hidden: Option<&'a BTreeSet<String>>) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn order(mut self, order: Option<&'a [String]>) -> Self {
        self.order = order;
        self
    }

    pub fn labels(mut self, labels: Option<&'a BTreeMap<String, String>>) -> Self {
        self.labels = labels;
        self
    }
}

/// Merge overrides onto `full`.
///
/// Hidden items are removed first. The survivors named in the order list come
/// first, in that list's sequence, followed by the rest in schema order.
/// Identifiers in the overrides that the schema no longer has are ignored.
///
/// `diction` supplies the default label for an identifier; the item's own
/// schema diction is used when it returns nothing.
pub fn merge_list<F>(full: &[Item], overrides: ListOverrides<'_>, diction: F) -> MergedView
where
    F: Fn(&str) -> Option<String>,
{
    let (hidden, visible): (Vec<&Item>, Vec<&Item>) = full
        .iter()
        .partition(|item| overrides.hidden.is_some_and(|h| h.contains(&item.value)));

    let ordered = match overrides.order {
        Some(order) => apply_order(visible, order),
        None => visible,
    };

    let label = |item: &Item| LabeledItem {
        value: item.value.clone(),
        label: resolve_label(&item.value, overrides.labels, |id| {
            diction(id).or_else(|| item.diction.clone())
        }),
    };

    MergedView {
        visible: ordered.into_iter().map(&label).collect(),
        hidden: hidden.into_iter().map(&label).collect(),
    }
}

fn apply_order<'i>(items: Vec<&'i Item>, order: &[String]) -> Vec<&'i Item> {
    let by_value: HashMap<&str, &'i Item> = items
        .iter()
        .map(|item| (item.value.as_str(), *item))
        .collect();

    let mut placed: HashSet<&str> = HashSet::with_capacity(order.len());
    let mut ordered = Vec::with_capacity(items.len());

    for value in order {
        if let Some(item) = by_value.get(value.as_str()) {
            if placed.insert(item.value.as_str()) {
                ordered.push(*item);
            }
        }
    }

    ordered.extend(
        items
            .iter()
            .filter(|item| !placed.contains(item.value.as_str())),
    );
    ordered
}
