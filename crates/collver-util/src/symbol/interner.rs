//! Concurrent string interner backed by `DashMap`.
//!
//! Strings are leaked to obtain `'static` references once, then shared by
//! every [`Symbol`](super::Symbol) that points at them. This is acceptable
//! because a compilation runs for a bounded time and interns a bounded set
//! of distinct names (procedure, extern, memory, const, and alias names,
//! plus keywords).

use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::LazyLock;

use super::Symbol;

pub(crate) static STRING_TABLE: LazyLock<StringTable> = LazyLock::new(|| {
    let table = StringTable::new();
    table.seed_known_symbols();
    table
});

pub(crate) struct StringTable {
    forward: DashMap<&'static str, u32>,
    reverse: DashMap<u32, &'static str>,
    next_index: AtomicU32,
}

/// Symbols below this index are keywords and data-type names pre-interned
/// at startup, so their indices are stable across a whole compilation.
const RESERVED_SYMBOLS_END: u32 = 64;

impl StringTable {
    fn new() -> Self {
        Self {
            forward: DashMap::with_capacity(128),
            reverse: DashMap::with_capacity(128),
            next_index: AtomicU32::new(RESERVED_SYMBOLS_END),
        }
    }

    fn seed_known_symbols(&self) {
        for (idx, text) in super::KNOWN_SYMBOLS.iter().enumerate() {
            let idx = idx as u32;
            debug_assert!(idx < RESERVED_SYMBOLS_END, "grow RESERVED_SYMBOLS_END");
            let leaked: &'static str = Box::leak(text.to_string().into_boxed_str());
            self.forward.insert(leaked, idx);
            self.reverse.insert(idx, leaked);
        }
    }

    pub(crate) fn intern(&self, text: &str) -> Symbol {
        if let Some(existing) = self.forward.get(text) {
            return Symbol {
                index: *existing.value(),
            };
        }

        // Leak once per unique string; a concurrent double-insert just leaks
        // twice and the loser's index is discarded.
        let leaked: &'static str = Box::leak(text.to_string().into_boxed_str());
        let idx = self.next_index.fetch_add(1, Ordering::Relaxed);
        self.forward.insert(leaked, idx);
        self.reverse.insert(idx, leaked);
        Symbol { index: idx }
    }

    pub(crate) fn resolve(&self, symbol: Symbol) -> &'static str {
        self.reverse
            .get(&symbol.index)
            .map(|entry| *entry.value())
            .unwrap_or("<invalid symbol>")
    }
}
