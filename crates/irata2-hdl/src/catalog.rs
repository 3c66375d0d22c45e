//! Control metadata and the sorted control catalog

use std::collections::HashMap;
use std::fmt;

use irata2_core::TickPhase;

use crate::HdlError;

/// Immutable metadata for one control line
///
/// `phase` is the tick phase during which the control's asserted state may
/// be observed; `auto_reset` controls whether the Clear phase releases it.
/// Paths are dot-joined from the root CPU, whose own path is empty.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ControlInfo {
    pub phase: TickPhase,
    pub auto_reset: bool,
    pub path: String,
}

/// Stable identifier of a control: its index in the sorted catalog.
///
/// The id doubles as the control's bit position in the 64-bit microcode
/// control word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ControlId(pub u8);

impl ControlId {
    #[inline]
    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    /// Bit mask of this control within a control word
    #[inline]
    pub fn bit(self) -> u64 {
        1u64 << self.0
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Sorted list of every control in the CPU, indexed by path
#[derive(Clone, Debug)]
pub struct Catalog {
    infos: Vec<ControlInfo>,
    index_by_path: HashMap<String, ControlId>,
}

impl Catalog {
    /// Build a catalog from an unordered control list.
    ///
    /// Paths are sorted to assign stable ids. At most 64 controls fit a
    /// control word; duplicates are construction errors.
    pub fn new(mut infos: Vec<ControlInfo>) -> Result<Catalog, HdlError> {
        if infos.len() > 64 {
            return Err(HdlError::TooManyControls(infos.len()));
        }
        infos.sort_by(|a, b| a.path.cmp(&b.path));

        let mut index_by_path = HashMap::with_capacity(infos.len());
        for (i, info) in infos.iter().enumerate() {
            let id = ControlId(i as u8);
            if index_by_path.insert(info.path.clone(), id).is_some() {
                return Err(HdlError::DuplicateControlPath(info.path.clone()));
            }
        }

        Ok(Catalog {
            infos,
            index_by_path,
        })
    }

    /// Number of controls
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// Metadata for a control id
    pub fn info(&self, id: ControlId) -> &ControlInfo {
        &self.infos[id.index()]
    }

    /// Path for a control id
    pub fn path(&self, id: ControlId) -> &str {
        &self.infos[id.index()].path
    }

    /// Find a control by path
    pub fn find(&self, path: &str) -> Option<ControlId> {
        self.index_by_path.get(path).copied()
    }

    /// Find a control by path, failing with context on miss
    pub fn require(&self, path: &str, context: &str) -> Result<ControlId, HdlError> {
        self.find(path).ok_or_else(|| HdlError::UnknownControlPath {
            path: path.to_string(),
            context: context.to_string(),
        })
    }

    /// All control paths in id order (sorted)
    pub fn paths(&self) -> Vec<String> {
        self.infos.iter().map(|info| info.path.clone()).collect()
    }

    /// Iterate over (id, info) pairs
    pub fn iter(&self) -> impl Iterator<Item = (ControlId, &ControlInfo)> {
        self.infos
            .iter()
            .enumerate()
            .map(|(i, info)| (ControlId(i as u8), info))
    }
}
