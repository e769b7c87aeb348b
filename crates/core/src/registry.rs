//! Instrument interning.
//!
//! Every quote and order that refers to the same security id shares one
//! [`InstrumentRef`], so identity checks are pointer-cheap and the tick size is
//! defined in one place.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::types::{Instrument, InstrumentRef};

/// Get-or-create registry of instruments keyed by security id.
///
/// Single-threaded: lookups borrow an inner `RefCell` for the duration of the
/// call only, so the registry can be shared as `Rc<InstrumentRegistry>`
/// between the replay source and strategies.
#[derive(Debug, Default)]
pub struct InstrumentRegistry {
    instruments: RefCell<HashMap<String, InstrumentRef>>,
}

impl InstrumentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the handle for `security_id`, creating it with the default tick
    /// size on first sight.
    pub fn get_or_create(&self, security_id: &str) -> InstrumentRef {
        if let Some(existing) = self.instruments.borrow().get(security_id) {
            return Rc::clone(existing);
        }
        self.insert(Instrument::new(security_id))
    }

    /// Register `security_id` with an explicit tick size.
    ///
    /// The first registration wins: an already known instrument is returned
    /// unchanged.
    pub fn with_price_step(&self, security_id: &str, price_step: f64) -> InstrumentRef {
        if let Some(existing) = self.instruments.borrow().get(security_id) {
            return Rc::clone(existing);
        }
        self.insert(Instrument {
            security_id: security_id.to_string(),
            price_step,
        })
    }

    /// Look up an instrument without creating it.
    pub fn get(&self, security_id: &str) -> Option<InstrumentRef> {
        self.instruments.borrow().get(security_id).cloned()
    }

    /// Number of registered instruments.
    pub fn len(&self) -> usize {
        self.instruments.borrow().len()
    }

    /// Whether no instrument has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.instruments.borrow().is_empty()
    }

    fn insert(&self, instrument: Instrument) -> InstrumentRef {
        let handle = Rc::new(instrument);
        self.instruments
            .borrow_mut()
            .insert(handle.security_id.clone(), Rc::clone(&handle));
        handle
    }
}
