use crate::FastMap;
use crate::model::{ResourceId, ResourceTable};
use crate::value::ScalarValue;

use bitflags::bitflags;
use std::cmp::Reverse;
use std::fmt;

bitflags! {
    /// The attr type word: which value formats an attribute accepts.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AttrFormat: u32 {
        const REFERENCE = 0x0000_0001;
        const STRING = 0x0000_0002;
        const INTEGER = 0x0000_0004;
        const BOOLEAN = 0x0000_0008;
        const COLOR = 0x0000_0010;
        const FLOAT = 0x0000_0020;
        const DIMENSION = 0x0000_0040;
        const FRACTION = 0x0000_0080;
        const ENUM = 0x0001_0000;
        const FLAGS = 0x0002_0000;
    }
}

const FORMAT_ANY: u32 = 0xFFFF;
const FORMAT_NAMES: [(AttrFormat, &str); 8] = [
    (AttrFormat::REFERENCE, "reference"),
    (AttrFormat::STRING, "string"),
    (AttrFormat::INTEGER, "integer"),
    (AttrFormat::BOOLEAN, "boolean"),
    (AttrFormat::COLOR, "color"),
    (AttrFormat::FLOAT, "float"),
    (AttrFormat::DIMENSION, "dimension"),
    (AttrFormat::FRACTION, "fraction"),
];

impl fmt::Display for AttrFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bits() & FORMAT_ANY == FORMAT_ANY {
            return write!(f, "any");
        }
        let names: Vec<&str> = FORMAT_NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "{}", names.join("|"))
    }
}

/// One `name = value` member of an enum or flags attribute. `id` names the member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttrMember {
    pub id: ResourceId,
    pub value: i32,
}

fn member_name(table: &ResourceTable, id: ResourceId) -> String {
    table
        .spec(id)
        .map(|spec| spec.name().to_owned())
        .unwrap_or_else(|| "@null".to_owned())
}

#[derive(Debug, Clone)]
pub struct EnumMembers {
    members: Vec<AttrMember>,
    by_value: FastMap<i32, usize>,
}

impl EnumMembers {
    pub fn new(members: Vec<AttrMember>) -> Self {
        let mut by_value = FastMap::default();
        for (idx, member) in members.iter().enumerate() {
            by_value.entry(member.value).or_insert(idx);
        }
        EnumMembers { members, by_value }
    }

    pub fn members(&self) -> &[AttrMember] {
        &self.members
    }

    /// First member declared with `value`.
    pub fn lookup(&self, value: i32) -> Option<&AttrMember> {
        self.by_value.get(&value).map(|&idx| &self.members[idx])
    }

    pub fn render(&self, table: &ResourceTable, value: i32) -> Option<String> {
        self.lookup(value).map(|member| member_name(table, member.id))
    }
}

impl PartialEq for EnumMembers {
    fn eq(&self, other: &Self) -> bool {
        self.members == other.members
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlagsMembers {
    zero: Vec<AttrMember>,
    /// Non-zero members, most bits set first.
    flags: Vec<AttrMember>,
}

impl FlagsMembers {
    pub fn new(members: Vec<AttrMember>) -> Self {
        let (zero, mut flags): (Vec<_>, Vec<_>) = members.into_iter().partition(|m| m.value == 0);
        flags.sort_by_key(|m| Reverse(m.value.count_ones()));
        FlagsMembers { zero, flags }
    }

    pub fn members(&self) -> impl Iterator<Item = &AttrMember> {
        self.zero.iter().chain(self.flags.iter())
    }

    /// Members selected for `value`: every member fully contained in it, skipping members that
    /// are a subset of one already selected. `0` selects the zero-valued members.
    pub fn select(&self, value: i32) -> Vec<&AttrMember> {
        if value == 0 {
            return self.zero.iter().collect();
        }

        let mut selected: Vec<&AttrMember> = Vec::new();
        for member in &self.flags {
            let bits = member.value;
            if value & bits != bits {
                continue;
            }
            if selected.iter().any(|s| s.value & bits == bits) {
                continue;
            }
            selected.push(member);
        }
        selected
    }

    pub fn render(&self, table: &ResourceTable, value: i32) -> Option<String> {
        let selected = self.select(value);
        if selected.is_empty() {
            // An unset field renders empty even without a zero-valued member.
            return (value == 0).then(String::new);
        }
        let names: Vec<String> = selected
            .iter()
            .map(|member| member_name(table, member.id))
            .collect();
        Some(names.join("|"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttrMembers {
    Plain,
    Enum(EnumMembers),
    Flags(FlagsMembers),
}

/// An attribute definition (`<attr>`).
#[derive(Debug, Clone, PartialEq)]
pub struct AttrBag {
    pub format: AttrFormat,
    pub min: Option<i32>,
    pub max: Option<i32>,
    pub l10n: Option<i32>,
    pub members: AttrMembers,
}

impl AttrBag {
    /// An attr without a type word or members.
    pub fn placeholder() -> Self {
        AttrBag {
            format: AttrFormat::empty(),
            min: None,
            max: None,
            l10n: None,
            members: AttrMembers::Plain,
        }
    }

    pub fn member_ids(&self) -> Vec<ResourceId> {
        match &self.members {
            AttrMembers::Plain => Vec::new(),
            AttrMembers::Enum(e) => e.members().iter().map(|m| m.id).collect(),
            AttrMembers::Flags(f) => f.members().map(|m| m.id).collect(),
        }
    }

    /// Render `value` through the member names, if this attr has members and `value` maps onto
    /// them.
    pub fn render_value(&self, table: &ResourceTable, value: &ScalarValue) -> Option<String> {
        let data = value.as_int()?;
        match &self.members {
            AttrMembers::Plain => None,
            AttrMembers::Enum(e) => e.render(table, data),
            AttrMembers::Flags(f) => f.render(table, data),
        }
    }
}
