//! LR(0) items and the canonical collection of parser states.
//!
//! An [`Item`] is a production index plus a dot position marking progress
//! through its right-hand side. Item identity is structural: two items are
//! equal iff they carry the same production id and dot. A state's identity
//! is its *kernel*, the item set it was reached with before closure, so
//! structurally identical kernels are deduplicated across the whole
//! automaton, which is also what bounds construction: productions and dot
//! positions are finite, so the kernel space is finite.
//!
//! Construction runs a breadth-first worklist from the single initial
//! kernel `{[S' -> . start]}`; closure itself is a second, inner worklist.
//! Neither recurses.

use crate::grammar::{is_nonterminal, Production};
use indexmap::IndexMap;
use smartstring::alias::String;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

/// An LR(0) item: `(production id, dot position)`, dot in `0..=rhs.len()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Item {
    /// Index of the production in the grammar.
    pub prod: usize,
    /// Dot position within the production's right-hand side.
    pub dot: usize,
}

impl Item {
    /// The symbol immediately after the dot, or `None` for a completed item.
    pub fn next_symbol<'a>(&self, prods: &'a [Production]) -> Option<&'a str> {
        prods[self.prod].rhs.get(self.dot).map(|s| s.as_str())
    }

    /// The item with the dot advanced one position.
    pub fn advanced(&self) -> Item {
        Item {
            prod: self.prod,
            dot: self.dot + 1,
        }
    }

    /// `true` once the dot has reached the end of the right-hand side.
    pub fn is_complete(&self, prods: &[Production]) -> bool {
        self.dot == prods[self.prod].rhs.len()
    }

    /// Renders `A -> a . b` form for dumps.
    pub fn render(&self, prods: &[Production]) -> String {
        let p = &prods[self.prod];
        let mut s = String::new();
        s.push_str(&p.lhs);
        s.push_str(" ->");
        for (i, sym) in p.rhs.iter().enumerate() {
            if i == self.dot {
                s.push_str(" .");
            }
            s.push(' ');
            s.push_str(sym);
        }
        if self.dot == p.rhs.len() {
            s.push_str(" .");
        }
        s
    }
}

/// The set of items a state was reached with, before closure.
pub type Kernel = BTreeSet<Item>;

/// A single parser state: its kernel, the closure-expanded item list in
/// discovery order, and the goto-successor per symbol after the dot.
#[derive(Debug)]
pub struct Itemset {
    /// Monotonically assigned state id, dense within one [`Itemsets`].
    pub id: usize,
    /// Kernel items; the state's identity.
    pub kernel: Kernel,
    /// Closure items, kernel first, in discovery order.
    pub items: Vec<Item>,
    /// Destination state reached by advancing the dot over a symbol.
    pub transitions: IndexMap<String, usize>,
}

impl Itemset {
    /// Items whose dot has reached the end of the right-hand side.
    pub fn completed<'a>(
        &'a self,
        prods: &'a [Production],
    ) -> impl Iterator<Item = &'a Item> {
        self.items.iter().filter(|it| it.is_complete(prods))
    }
}

/// The canonical collection: owns every state by id, deduplicated by
/// kernel. Ids are fields of this value, so independent grammars build
/// independent collections with no cross-talk.
#[derive(Debug)]
pub struct Itemsets {
    states: Vec<Itemset>,
    by_kernel: HashMap<Kernel, usize>,
}

impl Itemsets {
    /// Builds the full collection for an augmented production list,
    /// starting from the kernel `{[production 0, dot 0]}`.
    pub fn build(prods: &[Production]) -> Itemsets {
        let mut sets = Itemsets {
            states: Vec::new(),
            by_kernel: HashMap::new(),
        };
        let initial: Kernel = [Item { prod: 0, dot: 0 }].into_iter().collect();
        let (start, _) = sets.intern(initial, prods);

        let mut work = VecDeque::from([start]);
        while let Some(id) = work.pop_front() {
            // Group closure items by the symbol after the dot; each group
            // advances into one successor kernel.
            let mut groups: IndexMap<String, Vec<Item>> = IndexMap::new();
            for item in &sets.states[id].items {
                if let Some(sym) = item.next_symbol(prods) {
                    groups.entry(sym.into()).or_default().push(*item);
                }
            }
            for (sym, members) in groups {
                let kernel: Kernel = members.iter().map(Item::advanced).collect();
                let (target, fresh) = sets.intern(kernel, prods);
                if fresh {
                    work.push_back(target);
                }
                sets.states[id].transitions.insert(sym, target);
            }
        }
        log::trace!("item-set construction produced {} states", sets.len());
        sets
    }

    /// Returns the id of the state with this kernel, creating and closing
    /// it if no structurally identical kernel exists yet. The second
    /// element is `true` when the state is new.
    fn intern(&mut self, kernel: Kernel, prods: &[Production]) -> (usize, bool) {
        if let Some(&id) = self.by_kernel.get(&kernel) {
            return (id, false);
        }
        let id = self.states.len();
        let items = Self::closure(&kernel, prods);
        self.by_kernel.insert(kernel.clone(), id);
        self.states.push(Itemset {
            id,
            kernel,
            items,
            transitions: IndexMap::new(),
        });
        (id, true)
    }

    /// Worklist closure: for every item `[A -> a . X b]` with `X`
    /// nonterminal, add `[X -> . g]` for each production of `X`, until no
    /// new items appear. Membership checks are structural over
    /// `(production, dot)`.
    fn closure(kernel: &Kernel, prods: &[Production]) -> Vec<Item> {
        let mut items = Vec::new();
        let mut seen: HashSet<Item> = HashSet::new();
        let mut expanded: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<Item> = kernel.iter().copied().collect();

        while let Some(item) = queue.pop_front() {
            if !seen.insert(item) {
                continue;
            }
            items.push(item);
            if let Some(sym) = item.next_symbol(prods) {
                if is_nonterminal(sym) && expanded.insert(sym.into()) {
                    for p in prods.iter().filter(|p| p.lhs == sym) {
                        queue.push_back(Item { prod: p.id, dot: 0 });
                    }
                }
            }
        }
        items
    }

    /// Number of states.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// `true` when no states exist (only before [`Itemsets::build`] ran).
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// All states, in id order.
    pub fn states(&self) -> &[Itemset] {
        &self.states
    }

    /// The state with the given id.
    pub fn get(&self, id: usize) -> Option<&Itemset> {
        self.states.get(id)
    }

    /// Renders the whole collection for debugging: one block per state,
    /// each item with its transition target in braces.
    pub fn render(&self, prods: &[Production]) -> String {
        let mut out = std::string::String::new();
        for state in &self.states {
            out.push_str(&format!("i{}\n", state.id));
            for item in &state.items {
                out.push_str(item.render(prods).as_str());
                if let Some(sym) = item.next_symbol(prods) {
                    if let Some(target) = state.transitions.get(sym) {
                        out.push_str(&format!(" {{{}}}", target));
                    }
                }
                out.push('\n');
            }
            out.push('\n');
        }
        out.into()
    }
}
