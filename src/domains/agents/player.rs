use crate::common::{tenant_symbol, traveler_symbol, Clock, Position, Trace};
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: usize,
    pub symbol: char,
    pub position: Position,
    pub wild: bool,
}

impl Player {
    pub fn traveler(id: usize) -> Self {
        Self {
            id,
            symbol: traveler_symbol(id),
            position: Position::REMOVED,
            wild: false,
        }
    }

    pub fn wild_tenant(id: usize) -> Self {
        Self {
            id,
            symbol: tenant_symbol(id),
            position: Position::REMOVED,
            wild: true,
        }
    }

    /// Travelers are active while their symbol is uppercase.
    pub fn is_active(&self) -> bool {
        self.symbol.is_ascii_uppercase()
    }

    pub fn stop(&mut self) {
        self.symbol = self.symbol.to_ascii_lowercase();
    }

    pub fn trace(&self, clock: &Clock) -> Trace {
        clock.trace(self.id, self.position, self.symbol)
    }
}

/// Shared table of players, indexed by id.
///
/// Cells read it when recording occupant traces; each entry has its own
/// mutex and no guard is ever held across an await point.
#[derive(Debug)]
pub struct Roster {
    players: Vec<Mutex<Player>>,
}

impl Roster {
    /// Travelers take ids `0..travelers`, wild tenants follow.
    pub fn new(travelers: usize, wild_tenants: usize) -> Self {
        let players = (0..travelers)
            .map(Player::traveler)
            .chain((travelers..travelers + wild_tenants).map(Player::wild_tenant))
            .map(Mutex::new)
            .collect();
        Self { players }
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<Player> {
        self.players
            .get(id)
            .map(|p| p.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    pub fn update<R>(&self, id: usize, f: impl FnOnce(&mut Player) -> R) -> Option<R> {
        self.players
            .get(id)
            .map(|p| f(&mut p.lock().unwrap_or_else(PoisonError::into_inner)))
    }

    pub fn is_wild(&self, id: usize) -> bool {
        self.get(id).map(|p| p.wild).unwrap_or(false)
    }

    pub fn position(&self, id: usize) -> Position {
        self.get(id).map(|p| p.position).unwrap_or(Position::REMOVED)
    }

    pub fn set_position(&self, id: usize, position: Position) {
        self.update(id, |p| p.position = position);
    }

    pub fn trace(&self, id: usize, clock: &Clock) -> Option<Trace> {
        self.get(id).map(|p| p.trace(clock))
    }
}
