use std::fmt;

use serde::{Deserialize, Serialize};

use crate::character::ModifierCategory;
use crate::ids::ItemId;

/// Whether a die attacks or defends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    /// Slash, pierce and blunt dice.
    Offense,
    /// Block and evade dice.
    Defense,
}

impl Stance {
    /// The modifier category tied to this stance.
    pub fn modifier(self) -> ModifierCategory {
        match self {
            Self::Offense => ModifierCategory::Offense,
            Self::Defense => ModifierCategory::Defense,
        }
    }
}

/// The base kind of a combat die, with any counter prefix removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DieKind {
    /// Slash attack.
    Slash,
    /// Pierce attack.
    Pierce,
    /// Blunt attack.
    Blunt,
    /// Block defense.
    Block,
    /// Evade defense.
    Evade,
}

impl DieKind {
    /// Every die kind.
    pub const ALL: [DieKind; 5] = [
        Self::Slash,
        Self::Pierce,
        Self::Blunt,
        Self::Block,
        Self::Evade,
    ];

    /// Whether this kind attacks or defends.
    pub fn stance(self) -> Stance {
        match self {
            Self::Slash | Self::Pierce | Self::Blunt => Stance::Offense,
            Self::Block | Self::Evade => Stance::Defense,
        }
    }

    /// The sub-type modifier category for this kind.
    pub fn modifier(self) -> ModifierCategory {
        match self {
            Self::Slash => ModifierCategory::Slash,
            Self::Pierce => ModifierCategory::Pierce,
            Self::Blunt => ModifierCategory::Blunt,
            Self::Block => ModifierCategory::Block,
            Self::Evade => ModifierCategory::Evade,
        }
    }

    /// The tag used on sheets.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Slash => "slash",
            Self::Pierce => "pierce",
            Self::Blunt => "blunt",
            Self::Block => "block",
            Self::Evade => "evade",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.tag() == tag)
    }
}

/// The type tag of a die.
///
/// Parsed from free text: a `counter` prefix (optionally followed by `_`,
/// `-` or a space) marks a counter die, and anything unrecognised is kept
/// verbatim as [`DieType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DieType {
    /// A regular die.
    Standard(DieKind),
    /// A counter die of the given kind.
    Counter(DieKind),
    /// An unrecognised tag.
    Other(String),
}

impl DieType {
    /// Parse a type tag.
    pub fn parse(tag: &str) -> Self {
        let lower = tag.trim().to_ascii_lowercase();
        if let Some(kind) = DieKind::from_tag(&lower) {
            return Self::Standard(kind);
        }
        if let Some(rest) = lower.strip_prefix("counter") {
            let rest = rest.trim_start_matches(['_', '-', ' ']);
            if let Some(kind) = DieKind::from_tag(rest) {
                return Self::Counter(kind);
            }
        }
        Self::Other(tag.trim().to_string())
    }

    /// The base kind with any counter prefix stripped, if recognised.
    pub fn kind(&self) -> Option<DieKind> {
        match self {
            Self::Standard(kind) | Self::Counter(kind) => Some(*kind),
            Self::Other(_) => None,
        }
    }

    /// Whether this is a counter die.
    pub fn is_counter(&self) -> bool {
        matches!(self, Self::Counter(_))
    }
}

impl Default for DieType {
    fn default() -> Self {
        Self::Standard(DieKind::Slash)
    }
}

impl From<String> for DieType {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<DieType> for String {
    fn from(t: DieType) -> Self {
        t.to_string()
    }
}

impl fmt::Display for DieType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard(kind) => f.write_str(kind.tag()),
            Self::Counter(kind) => write!(f, "counter_{}", kind.tag()),
            Self::Other(s) => f.write_str(s),
        }
    }
}

/// One die of a skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Die {
    /// Type tag; selects the icon and the modifier categories.
    #[serde(rename = "type", default)]
    pub die_type: DieType,
    /// Dice formula such as "2d6+3".
    pub formula: String,
    /// Free-text annotations, shown with the roll but never evaluated.
    #[serde(default, alias = "mods")]
    pub annotations: Vec<String>,
}

impl Die {
    /// Create a die with no annotations.
    pub fn new(die_type: DieType, formula: impl Into<String>) -> Self {
        Self {
            die_type,
            formula: formula.into(),
            annotations: Vec::new(),
        }
    }

    /// Attach an annotation.
    pub fn annotated(mut self, note: impl Into<String>) -> Self {
        self.annotations.push(note.into());
        self
    }
}

/// A skill: an ordered set of dice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    /// Item identifier.
    #[serde(default)]
    pub id: ItemId,
    /// Display name.
    pub name: String,
    /// Dice in roll order.
    #[serde(default)]
    pub dice: Vec<Die>,
    /// Attack weight; only shown when greater than 1.
    #[serde(default)]
    pub weight: Option<u32>,
    /// Free-text skill modules.
    #[serde(default)]
    pub modules: Vec<String>,
}

impl Skill {
    /// Create an empty skill.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ItemId::new(),
            name: name.into(),
            dice: Vec::new(),
            weight: None,
            modules: Vec::new(),
        }
    }

    /// Append a die.
    pub fn with_die(mut self, die: Die) -> Self {
        self.dice.push(die);
        self
    }

    /// Set the attack weight.
    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Append a skill module annotation.
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.modules.push(module.into());
        self
    }
}

/// Direction in which a status moves its target resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StatusEffect {
    /// Raise the target resources.
    Increase,
    /// Lower the target resources.
    #[default]
    Decrease,
}

/// Which resources a status affects when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusTarget {
    /// Health only.
    #[default]
    Hp,
    /// Stagger only.
    Stagger,
    /// Both health and stagger.
    HpStagger,
}

impl StatusTarget {
    /// Whether health is affected.
    pub fn hits_health(self) -> bool {
        matches!(self, Self::Hp | Self::HpStagger)
    }

    /// Whether stagger is affected.
    pub fn hits_stagger(self) -> bool {
        matches!(self, Self::Stagger | Self::HpStagger)
    }
}

/// How a post-active rule changes a status count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PostActiveOperator {
    /// `count + variable`.
    Add,
    /// `count - variable`.
    Subtract,
    /// `count * variable`.
    Multiply,
    /// `floor(count / variable)`; a zero divisor leaves the count alone.
    Divide,
    /// Leave the count alone.
    Maintain,
    /// An operator the engine does not understand.
    Unknown(String),
}

impl From<String> for PostActiveOperator {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "add" => Self::Add,
            "subtract" => Self::Subtract,
            "multiply" => Self::Multiply,
            "divide" => Self::Divide,
            "maintain" => Self::Maintain,
            _ => Self::Unknown(s),
        }
    }
}

impl From<PostActiveOperator> for String {
    fn from(op: PostActiveOperator) -> Self {
        op.to_string()
    }
}

impl fmt::Display for PostActiveOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => f.write_str("add"),
            Self::Subtract => f.write_str("subtract"),
            Self::Multiply => f.write_str("multiply"),
            Self::Divide => f.write_str("divide"),
            Self::Maintain => f.write_str("maintain"),
            Self::Unknown(s) => f.write_str(s),
        }
    }
}

/// A rule describing how a status count changes after it fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostActiveRule {
    /// The arithmetic to apply.
    pub operator: PostActiveOperator,
    /// The right-hand operand.
    #[serde(default)]
    pub variable: i64,
}

impl PostActiveRule {
    /// Create a rule.
    pub fn new(operator: PostActiveOperator, variable: i64) -> Self {
        Self { operator, variable }
    }
}

/// A stackable status such as bleed or burn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// Item identifier.
    #[serde(default)]
    pub id: ItemId,
    /// Display name.
    pub name: String,
    /// Stack size.
    #[serde(default)]
    pub count: u32,
    /// Direction of the resource change.
    #[serde(default)]
    pub effect: StatusEffect,
    /// Resources affected.
    #[serde(default)]
    pub target: StatusTarget,
    /// Multiplier applied to the count when firing.
    #[serde(default = "default_potency")]
    pub potency: i32,
    /// Count rules, selectable when the status fires.
    #[serde(default)]
    pub post_actives: Vec<PostActiveRule>,
}

fn default_potency() -> i32 {
    1
}

impl Status {
    /// Create a status with potency 1 and no rules.
    pub fn new(name: impl Into<String>, effect: StatusEffect, target: StatusTarget) -> Self {
        Self {
            id: ItemId::new(),
            name: name.into(),
            count: 0,
            effect,
            target,
            potency: default_potency(),
            post_actives: Vec::new(),
        }
    }

    /// Set the stack count.
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    /// Set the potency.
    pub fn with_potency(mut self, potency: i32) -> Self {
        self.potency = potency;
        self
    }

    /// Append a post-active rule.
    pub fn with_rule(mut self, rule: PostActiveRule) -> Self {
        self.post_actives.push(rule);
        self
    }
}
