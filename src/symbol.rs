//! Symbol table: name-indexed symbol storage with the attribute
//! exclusivity rules of spec §3.
//!
//! Adapted from the teacher's original `symbol.rs`, which interned
//! plain names into a `Vec<Box<SymbolInfo>>` behind a
//! `HashMap<String, Symbol>`. Here the table owns full `Symbol`
//! records directly (nothing else in this crate needs a lightweight
//! interned id) and keeps an insertion-ordered name list alongside the
//! map so `.ent`/`.ext` emission can walk symbols in discovery order
//! (spec §4.5).

use std::collections::HashMap;

use bitflags::bitflags;

use crate::error::{symbol_conflict, AsmResult};

bitflags! {
    /// Attribute set a symbol may carry. See spec §3 for the
    /// exclusivity rules enforced by [`SymbolTable::add_attrs`].
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct SymbolAttrs: u8 {
        const CODE     = 0b0001;
        const DATA     = 0b0010;
        const EXTERNAL = 0b0100;
        const ENTRY    = 0b1000;
    }
}

#[derive(Clone, Debug)]
pub struct Symbol {
    pub name: String,
    pub value: u32,
    pub attrs: SymbolAttrs,
}

#[derive(Default)]
pub struct SymbolTable {
    map: HashMap<String, Symbol>,
    order: Vec<String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    /// Insert a new symbol, or tolerate re-inserting an already-External
    /// symbol as external again (spec §3: "reinserting an already-External
    /// is a no-op"). Any other name collision is an error.
    pub fn add(
        &mut self,
        file: &str,
        line: usize,
        name: &str,
        value: u32,
        attrs: SymbolAttrs,
    ) -> AsmResult<()> {
        if let Some(existing) = self.map.get(name) {
            if attrs == SymbolAttrs::EXTERNAL && existing.attrs.contains(SymbolAttrs::EXTERNAL) {
                return Ok(());
            }
            return Err(symbol_conflict(
                file,
                line,
                format!("Symbol '{name}' already defined"),
            ));
        }
        self.order.push(name.to_string());
        self.map.insert(
            name.to_string(),
            Symbol {
                name: name.to_string(),
                value,
                attrs,
            },
        );
        Ok(())
    }

    pub fn find(&self, name: &str) -> Option<&Symbol> {
        self.map.get(name)
    }

    /// Add attributes to an existing symbol, enforcing spec §3's
    /// exclusivity lattice:
    /// - External is mutually exclusive with Code, Data, and Entry.
    /// - Code and Data are mutually exclusive with each other.
    /// - Adding an attribute the symbol already has is a no-op (covers
    ///   the "Entry re-added to an Entry+Code symbol" tolerance from
    ///   spec §9).
    pub fn add_attrs(
        &mut self,
        file: &str,
        line: usize,
        name: &str,
        attrs: SymbolAttrs,
    ) -> AsmResult<()> {
        let Some(sym) = self.map.get_mut(name) else {
            return Err(symbol_conflict(
                file,
                line,
                format!("Undefined symbol '{name}'"),
            ));
        };

        let incoming = attrs.difference(sym.attrs);
        if incoming.is_empty() {
            return Ok(());
        }

        let external_conflict = (sym.attrs.contains(SymbolAttrs::EXTERNAL)
            && incoming.intersects(SymbolAttrs::CODE | SymbolAttrs::DATA | SymbolAttrs::ENTRY))
            || (incoming.contains(SymbolAttrs::EXTERNAL)
                && sym
                    .attrs
                    .intersects(SymbolAttrs::CODE | SymbolAttrs::DATA | SymbolAttrs::ENTRY));
        let code_data_conflict = (sym.attrs.contains(SymbolAttrs::CODE)
            && incoming.contains(SymbolAttrs::DATA))
            || (sym.attrs.contains(SymbolAttrs::DATA) && incoming.contains(SymbolAttrs::CODE));

        if external_conflict || code_data_conflict {
            return Err(symbol_conflict(
                file,
                line,
                format!("Symbol '{name}' has conflicting attributes"),
            ));
        }

        sym.attrs |= incoming;
        Ok(())
    }

    /// Post-first-pass relocation: add `offset` to every Data symbol's
    /// value (spec §3: data storage is laid out immediately after code).
    pub fn bulk_relocate_data(&mut self, offset: u32) {
        for sym in self.map.values_mut() {
            if sym.attrs.contains(SymbolAttrs::DATA) {
                sym.value += offset;
            }
        }
    }

    /// Symbols in the order they were first defined — the order the
    /// artifact writer uses for `.ent` emission.
    pub fn iter_in_order(&self) -> impl Iterator<Item = &Symbol> {
        self.order.iter().map(move |name| &self.map[name])
    }
}
