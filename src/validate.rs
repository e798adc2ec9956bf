//! Static checks over a resolved schema.
//!
//! Findings are collected in one depth-first pass instead of stopping at the
//! first problem. The only early exit is the depth bound, which stops
//! descending into the offending subtree.
//!
//! A definition shared by several references is checked once per depth it
//! is reached at, and its findings carry the first path that reached it.
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::guide::{Guide, GuideKind, Literal};
use crate::node::{NodeKind, PrimitiveKind};
use crate::path::Path;
use crate::resolved::ResolvedNode;

pub const DEFAULT_MAX_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Deepest allowed nesting, counting the root as depth 0.
    pub max_depth: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self { max_depth: DEFAULT_MAX_DEPTH }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "finding", rename_all = "snake_case")]
pub enum FindingKind {
    IncompatibleGuide { guide: GuideKind, node: NodeKind },
    /// The same guide kind attached more than once to one node.
    DuplicateGuide { guide: GuideKind },
    /// A `choices` literal that can never match the primitive kind.
    ChoiceTypeMismatch { literal: String, node: NodeKind },
    EmptyObject,
    RedundantUnionAlternative { index: usize, duplicate_of: usize },
    SchemaTooDeep { depth: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub severity: Severity,
    pub path: Path,
    #[serde(flatten)]
    pub kind: FindingKind,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    pub findings: Vec<Finding>,
}

#[derive(Debug, Clone, Default)]
pub struct SchemaValidator {
    config: ValidatorConfig,
}

// ————————————————————————————————————————————————————————————————————————————
// VALIDATION
// ————————————————————————————————————————————————————————————————————————————

/// Validate with the default configuration.
pub fn validate(node: &ResolvedNode) -> Report {
    SchemaValidator::default().validate(node)
}

impl SchemaValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> ValidatorConfig {
        self.config
    }

    pub fn validate(&self, node: &ResolvedNode) -> Report {
        let mut pass = Pass::default();
        self.visit(node, &Path::root(), 0, &mut pass);
        Report { findings: pass.findings }
    }

    fn visit(&self, node: &ResolvedNode, path: &Path, depth: usize, pass: &mut Pass) {
        if depth > self.config.max_depth {
            pass.findings.push(Finding::error(path, FindingKind::SchemaTooDeep { depth }));
            return;
        }
        if let ResolvedNode::Reference(reference) = node {
            if !pass.seen.insert((reference.target_id(), depth)) {
                return;
            }
            // references add no nesting of their own
            return self.visit(&reference.target, path, depth, pass);
        }

        check_guides(node, path, &mut pass.findings);

        match node {
            ResolvedNode::Primitive { .. } | ResolvedNode::Enum { .. } => {}
            ResolvedNode::Reference(_) => unreachable!("peeled above"),
            ResolvedNode::Array { element, .. } => {
                self.visit(element, &path.element(), depth + 1, pass);
            }
            ResolvedNode::Object { properties, .. } => {
                if properties.is_empty() {
                    pass.findings.push(Finding::warning(path, FindingKind::EmptyObject));
                }
                for (name, property) in properties {
                    self.visit(&property.node, &path.field(name), depth + 1, pass);
                }
            }
            ResolvedNode::Union { alternatives, .. } => {
                for (index, alternative) in alternatives.iter().enumerate() {
                    let earlier =
                        alternatives[..index].iter().position(|a| a.same_structure(alternative));
                    if let Some(duplicate_of) = earlier {
                        pass.findings.push(Finding::error(
                            path,
                            FindingKind::RedundantUnionAlternative { index, duplicate_of },
                        ));
                    }
                }
                for (index, alternative) in alternatives.iter().enumerate() {
                    self.visit(alternative, &path.alternative(index), depth + 1, pass);
                }
            }
        }
    }
}

#[derive(Default)]
struct Pass {
    findings: Vec<Finding>,
    /// Shared reference targets already checked, with the depth they were reached at.
    seen: HashSet<(*const ResolvedNode, usize)>,
}

fn check_guides(node: &ResolvedNode, path: &Path, out: &mut Vec<Finding>) {
    let node_kind = node.kind();
    let mut counts = BTreeMap::<GuideKind, usize>::new();

    for guide in node.guides() {
        *counts.entry(guide.kind()).or_default() += 1;

        if !guide_fits(guide.kind(), node_kind) {
            out.push(Finding::error(
                path,
                FindingKind::IncompatibleGuide { guide: guide.kind(), node: node_kind },
            ));
            continue;
        }
        if let (Guide::Choices(literals), NodeKind::Primitive(kind)) = (guide, node_kind) {
            for literal in literals.iter().filter(|l| !literal_fits(l, kind)) {
                out.push(Finding::error(
                    path,
                    FindingKind::ChoiceTypeMismatch { literal: literal.to_string(), node: node_kind },
                ));
            }
        }
    }

    for (guide, count) in counts {
        if count > 1 {
            out.push(Finding::error(path, FindingKind::DuplicateGuide { guide }));
        }
    }
}

fn guide_fits(guide: GuideKind, node: NodeKind) -> bool {
    match (guide, node) {
        (GuideKind::Range, NodeKind::Primitive(kind)) => kind.is_numeric(),
        (GuideKind::Pattern, NodeKind::Primitive(kind)) => kind == PrimitiveKind::String,
        (GuideKind::Count, NodeKind::Array) => true,
        (GuideKind::Choices, NodeKind::Primitive(_)) => true,
        _ => false,
    }
}

fn literal_fits(literal: &Literal, kind: PrimitiveKind) -> bool {
    match (literal, kind) {
        (Literal::String(_), PrimitiveKind::String) => true,
        (Literal::Boolean(_), PrimitiveKind::Boolean) => true,
        (Literal::Number(_), PrimitiveKind::Number) => true,
        (Literal::Number(n), PrimitiveKind::Integer) => n.fract() == 0.0,
        _ => false,
    }
}

// ————————————————————————————————————————————————————————————————————————————
// REPORT
// ————————————————————————————————————————————————————————————————————————————

impl Finding {
    fn error(path: &Path, kind: FindingKind) -> Self {
        Self { severity: Severity::Error, path: path.clone(), kind }
    }
    fn warning(path: &Path, kind: FindingKind) -> Self {
        Self { severity: Severity::Warning, path: path.clone(), kind }
    }
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl Report {
    /// No error-level findings; warnings are allowed.
    pub fn is_valid(&self) -> bool {
        !self.findings.iter().any(Finding::is_error)
    }
    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.severity == Severity::Error)
    }
    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.severity == Severity::Warning)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        })
    }
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FindingKind::IncompatibleGuide { guide, node } => {
                write!(f, "`{guide}` guide cannot apply to {node}")
            }
            FindingKind::DuplicateGuide { guide } => {
                write!(f, "`{guide}` guide attached more than once")
            }
            FindingKind::ChoiceTypeMismatch { literal, node } => {
                write!(f, "choice {literal} can never be a valid {node}")
            }
            FindingKind::EmptyObject => f.write_str("object declares no properties"),
            FindingKind::RedundantUnionAlternative { index, duplicate_of } => {
                write!(f, "union alternative {index} duplicates alternative {duplicate_of}")
            }
            FindingKind::SchemaTooDeep { depth } => {
                write!(f, "nesting depth {depth} exceeds the configured maximum")
            }
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}: {}", self.severity, self.path, self.kind)
    }
}
