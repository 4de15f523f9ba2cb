//! Call-site signature selection.
//!
//! Matching runs in three phases per candidate overload:
//! 1. **Arity**: arguments are mapped onto parameters, producing a
//!    parameter -> arguments table and arity errors (missing, unexpected
//!    keyword, too many).
//! 2. **Annotations**: each mapped argument is solved against its
//!    parameter's annotation, with mutable-literal weakening when the
//!    annotation has no free variables.
//! 3. **Ranking**: the closest candidate is found by successive minimums
//!    over (arity errors, distinct mismatched positions, earliest mismatch),
//!    ties preferring source order.

use crate::order::TypeOrder;
use crate::weaken;
use pyrite_ast::{Expression, Node};
use pyrite_types::constraints::ConstraintSet;
use pyrite_types::{
    mark_all_free_variables_as_escaped, namespace_all_free_variables, well_known, Callable,
    CallableParameter, CallableParameters, Overload, StarParameter, Tuple, Type,
};
use pyrite_common::Atom;
use tracing::debug;

/// How an argument was written at the call site.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgumentKind {
    Positional,
    Named,
    /// `*args`
    SingleStar,
    /// `**kwargs`
    DoubleStar,
}

#[derive(Clone, Debug)]
pub struct CallArgument {
    pub kind: ArgumentKind,
    pub name: Option<Atom>,
    /// The original expression, when one exists; drives literal weakening.
    pub expression: Option<Node<Expression>>,
    pub resolved: Type,
}

impl CallArgument {
    pub fn positional(resolved: Type) -> Self {
        Self {
            kind: ArgumentKind::Positional,
            name: None,
            expression: None,
            resolved,
        }
    }

    pub fn named(name: Atom, resolved: Type) -> Self {
        Self {
            kind: ArgumentKind::Named,
            name: Some(name),
            expression: None,
            resolved,
        }
    }

    pub fn with_expression(mut self, expression: Node<Expression>) -> Self {
        self.expression = Some(expression);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignatureSelectionReason {
    TooManyArguments { expected: usize, provided: usize },
    MissingArgument(Atom),
    MismatchWithListVariadicTypeVariable,
    ProtocolInstantiation(Atom),
    AbstractClassInstantiation(Atom),
    MutuallyRecursiveTypeVariables,
    UnexpectedKeyword(Atom),
    CallingParameterVariadicTypeVariable,
    Mismatch {
        position: usize,
        expected: Type,
        actual: Type,
    },
}

impl SignatureSelectionReason {
    /// Higher wins when choosing what to report.
    fn importance(&self) -> u32 {
        match self {
            SignatureSelectionReason::Mismatch { .. } => 0,
            SignatureSelectionReason::TooManyArguments { .. } => 1,
            SignatureSelectionReason::MissingArgument(_) => 2,
            SignatureSelectionReason::MismatchWithListVariadicTypeVariable => 3,
            SignatureSelectionReason::ProtocolInstantiation(_) => 4,
            SignatureSelectionReason::AbstractClassInstantiation(_) => 5,
            SignatureSelectionReason::MutuallyRecursiveTypeVariables => 6,
            SignatureSelectionReason::UnexpectedKeyword(_) => 7,
            SignatureSelectionReason::CallingParameterVariadicTypeVariable => 8,
        }
    }
}

#[derive(Clone, Debug)]
pub enum SignatureMatch {
    /// The selected callable with its return (and parameters) instantiated.
    Found(Callable),
    NotFound {
        callable: Callable,
        reason: Option<SignatureSelectionReason>,
    },
}

impl SignatureMatch {
    pub fn return_annotation(&self) -> Option<&Type> {
        match self {
            SignatureMatch::Found(callable) => Some(&callable.implementation.annotation),
            SignatureMatch::NotFound { .. } => None,
        }
    }
}

/// One candidate overload after phases 1 and 2.
struct RankedCandidate {
    overload: Overload,
    solution_return: Option<Type>,
    arity_errors: Vec<SignatureSelectionReason>,
    mismatches: Vec<SignatureSelectionReason>,
    source_index: usize,
}

impl RankedCandidate {
    fn arity_rank(&self) -> usize {
        self.arity_errors.len()
    }

    fn annotation_rank(&self) -> usize {
        let mut positions: Vec<usize> = self
            .mismatches
            .iter()
            .filter_map(|reason| match reason {
                SignatureSelectionReason::Mismatch { position, .. } => Some(*position),
                _ => None,
            })
            .collect();
        positions.sort_unstable();
        positions.dedup();
        positions.len().max(if self.mismatches.is_empty() { 0 } else { 1 })
    }

    fn position_rank(&self) -> i64 {
        self.mismatches
            .iter()
            .filter_map(|reason| match reason {
                SignatureSelectionReason::Mismatch { position, .. } => Some(*position as i64),
                _ => None,
            })
            .min()
            .map(|position| -position)
            .unwrap_or(i64::MIN)
    }

    fn is_clean(&self) -> bool {
        self.arity_errors.is_empty() && self.mismatches.is_empty()
    }

    fn worst_reason(&self) -> Option<SignatureSelectionReason> {
        self.arity_errors
            .iter()
            .chain(self.mismatches.iter())
            .max_by_key(|reason| reason.importance())
            .cloned()
    }
}

/// Match `arguments` against `callable`, returning the selected signature or
/// the closest failure.
pub fn signature_select(
    order: &mut TypeOrder<'_>,
    callable: &Callable,
    arguments: &[CallArgument],
) -> SignatureMatch {
    let candidates: Vec<&Overload> = callable.signatures();
    let mut ranked: Vec<RankedCandidate> = Vec::with_capacity(candidates.len());
    for (source_index, overload) in candidates.into_iter().enumerate() {
        ranked.push(check_overload(order, overload, arguments, source_index));
    }

    // Successive minimums; earlier overloads win ties.
    let best = ranked
        .into_iter()
        .min_by(|left, right| {
            left.arity_rank()
                .cmp(&right.arity_rank())
                .then(left.annotation_rank().cmp(&right.annotation_rank()))
                .then(left.position_rank().cmp(&right.position_rank()))
                .then(left.source_index.cmp(&right.source_index))
        });
    let Some(best) = best else {
        return SignatureMatch::NotFound {
            callable: callable.clone(),
            reason: None,
        };
    };

    if best.is_clean() {
        let mut selected = callable.clone();
        selected.implementation = Overload {
            annotation: best
                .solution_return
                .unwrap_or_else(|| best.overload.annotation.clone()),
            parameters: best.overload.parameters.clone(),
        };
        selected.overloads = Vec::new();
        SignatureMatch::Found(selected)
    } else {
        debug!(
            "no overload matched; closest had {} arity and {} annotation errors",
            best.arity_rank(),
            best.mismatches.len()
        );
        SignatureMatch::NotFound {
            callable: callable.clone(),
            reason: best.worst_reason(),
        }
    }
}

/// What landed on one parameter.
enum MappedArgument {
    Argument(CallArgument),
    Default,
}

fn check_overload(
    order: &mut TypeOrder<'_>,
    overload: &Overload,
    arguments: &[CallArgument],
    source_index: usize,
) -> RankedCandidate {
    // Freshen the overload so concurrent selections cannot share variables.
    let namespace = pyrite_types::fresh_namespace();
    let freshened_type = namespace_all_free_variables(
        &Type::Callable(Box::new(Callable::anonymous(overload.clone()))),
        namespace,
    );
    let freshened = match &freshened_type {
        Type::Callable(callable) => callable.implementation.clone(),
        _ => overload.clone(),
    };

    let parameters = match &freshened.parameters {
        CallableParameters::Defined(parameters) => parameters.clone(),
        CallableParameters::Undefined => {
            // Accepts anything; the return is the annotation as declared.
            return RankedCandidate {
                overload: freshened.clone(),
                solution_return: Some(freshened.annotation),
                arity_errors: Vec::new(),
                mismatches: Vec::new(),
                source_index,
            };
        }
        CallableParameters::ParameterVariadicTypeVariable { .. } => {
            return RankedCandidate {
                overload: freshened.clone(),
                solution_return: None,
                arity_errors: vec![SignatureSelectionReason::CallingParameterVariadicTypeVariable],
                mismatches: Vec::new(),
                source_index,
            };
        }
    };

    let (mapping, arity_errors) = map_arguments(&parameters, arguments);
    let mut mismatches = Vec::new();
    let mut constraints = vec![ConstraintSet::empty()];

    for (parameter_index, mapped) in &mapping {
        let parameter = &parameters[*parameter_index];
        for mapped in mapped {
            let MappedArgument::Argument(argument) = mapped else {
                continue;
            };
            match parameter {
                CallableParameter::Variable(StarParameter::Concatenation(concatenation)) => {
                    let concrete = vec![argument.resolved.clone()];
                    let mut next = Vec::new();
                    for current in &constraints {
                        next.extend(order.solve_concrete_against_concatenation(
                            current,
                            &concrete,
                            concatenation,
                            true,
                        ));
                    }
                    if next.is_empty() {
                        mismatches
                            .push(SignatureSelectionReason::MismatchWithListVariadicTypeVariable);
                    } else {
                        constraints = next;
                    }
                }
                parameter => {
                    let Some(expected) = parameter.annotation() else {
                        continue;
                    };
                    let actual = effective_argument_type(order, argument, expected);
                    let mut next = Vec::new();
                    for current in &constraints {
                        next.extend(solve_argument(
                            order,
                            current,
                            argument,
                            &actual,
                            expected,
                        ));
                    }
                    if next.is_empty() {
                        mismatches.push(SignatureSelectionReason::Mismatch {
                            position: *parameter_index,
                            expected: expected.clone(),
                            actual,
                        });
                    } else {
                        constraints = next;
                    }
                }
            }
        }
    }

    let solution_return = if arity_errors.is_empty() && mismatches.is_empty() {
        let fresh_unaries = pyrite_types::visitor::collect_free_variables(&freshened_type)
            .into_iter()
            .filter_map(|variable| match variable {
                pyrite_types::Variable::Unary(unary) if unary.namespace == namespace => {
                    Some(unary)
                }
                _ => None,
            });
        let seeded = constraints
            .first()
            .cloned()
            .unwrap_or_else(ConstraintSet::empty)
            .add_fallback_to_any(fresh_unaries);
        match seeded.solve(order) {
            Some(solution) => {
                let instantiated = solution.instantiate(&freshened.annotation);
                // Whatever survived solving escapes, then dissolves.
                let escaped = mark_all_free_variables_as_escaped(&instantiated);
                Some(pyrite_types::collapse_all_escaped_variable_unions(&escaped))
            }
            None => {
                mismatches.push(SignatureSelectionReason::MutuallyRecursiveTypeVariables);
                None
            }
        }
    } else {
        None
    };

    RankedCandidate {
        overload: freshened,
        solution_return,
        arity_errors,
        mismatches,
        source_index,
    }
}

/// The type an argument contributes at its parameter: splatted arguments
/// contribute their element or value types.
fn effective_argument_type(
    order: &mut TypeOrder<'_>,
    argument: &CallArgument,
    _expected: &Type,
) -> Type {
    let names = well_known();
    match argument.kind {
        ArgumentKind::SingleStar => match argument.resolved.strip_annotated() {
            Type::Tuple(Tuple::Bounded(pyrite_types::OrderedTypes::Concrete(elements))) => {
                Type::union(elements.clone())
            }
            Type::Tuple(Tuple::Unbounded(element)) => (**element).clone(),
            resolved => order
                .handler
                .hierarchy()
                .instantiate_successors_parameters(resolved, names.iterable)
                .and_then(|parameters| {
                    parameters
                        .first()
                        .and_then(|parameter| parameter.as_single().cloned())
                })
                .unwrap_or(Type::Any),
        },
        ArgumentKind::DoubleStar => order
            .handler
            .hierarchy()
            .instantiate_successors_parameters(argument.resolved.strip_annotated(), names.mapping)
            .and_then(|parameters| parameters.get(1).cloned())
            .and_then(|parameter| parameter.as_single().cloned())
            .unwrap_or(Type::Any),
        _ => argument.resolved.clone(),
    }
}

fn solve_argument(
    order: &mut TypeOrder<'_>,
    constraints: &ConstraintSet,
    argument: &CallArgument,
    actual: &Type,
    expected: &Type,
) -> Vec<ConstraintSet> {
    let names = well_known();

    // `f(**kwargs)` against a `Mapping[K, V]` keywords parameter pins the
    // key side to `str` before the value check.
    if argument.kind == ArgumentKind::DoubleStar {
        if let Type::Parametric { name, parameters } = expected.strip_annotated() {
            if *name == names.mapping || *name == names.dict {
                if let Some(key) = parameters.first().and_then(|parameter| parameter.as_single()) {
                    let string_bound =
                        order.solve_less_or_equal(constraints, &Type::string(), key);
                    let mut results = Vec::new();
                    for constraints in &string_bound {
                        results.extend(order.solve_less_or_equal(constraints, actual, expected));
                    }
                    return results;
                }
            }
        }
    }

    // Weakening only applies when the expectation is fully resolved;
    // otherwise it would paper over genuine inference.
    let weakened = if pyrite_types::visitor::collect_free_variables(expected).is_empty() {
        weaken::weaken_mutable_literals(
            order,
            argument.expression.as_ref(),
            actual,
            expected,
        )
    } else {
        actual.clone()
    };
    order.solve_less_or_equal(constraints, &weakened, expected)
}

/// Phase 1: arity. Walk arguments and parameters in tandem, producing the
/// parameter -> arguments mapping and arity errors.
fn map_arguments(
    parameters: &[CallableParameter],
    arguments: &[CallArgument],
) -> (Vec<(usize, Vec<MappedArgument>)>, Vec<SignatureSelectionReason>) {
    let names = well_known();
    let mut errors = Vec::new();
    let mut mapping: Vec<(usize, Vec<MappedArgument>)> = Vec::new();

    let mut positional: std::collections::VecDeque<&CallArgument> = arguments
        .iter()
        .filter(|argument| argument.kind == ArgumentKind::Positional)
        .collect();
    let star_arguments: Vec<&CallArgument> = arguments
        .iter()
        .filter(|argument| argument.kind == ArgumentKind::SingleStar)
        .collect();
    let mut named: Vec<&CallArgument> = arguments
        .iter()
        .filter(|argument| argument.kind == ArgumentKind::Named)
        .collect();
    let double_star_arguments: Vec<&CallArgument> = arguments
        .iter()
        .filter(|argument| argument.kind == ArgumentKind::DoubleStar)
        .collect();

    let mut saw_star_parameter = false;
    let mut saw_keywords_parameter = false;

    for (index, parameter) in parameters.iter().enumerate() {
        match parameter {
            CallableParameter::PositionalOnly { default, .. } => {
                let mapped = if let Some(argument) = positional.pop_front() {
                    vec![MappedArgument::Argument(argument.clone())]
                } else if let Some(star) = star_arguments.first() {
                    vec![MappedArgument::Argument((*star).clone())]
                } else if *default {
                    vec![MappedArgument::Default]
                } else {
                    errors.push(SignatureSelectionReason::MissingArgument(
                        pyrite_common::intern(&format!("${}", index)),
                    ));
                    continue;
                };
                mapping.push((index, mapped));
            }
            CallableParameter::Named { name, default, .. } => {
                let mapped = if let Some(argument) = positional.pop_front() {
                    vec![MappedArgument::Argument(argument.clone())]
                } else if let Some(position) = named
                    .iter()
                    .position(|argument| argument.name == Some(*name))
                {
                    vec![MappedArgument::Argument(named.remove(position).clone())]
                } else if let Some(star) = star_arguments.first() {
                    vec![MappedArgument::Argument((*star).clone())]
                } else if let Some(double_star) = double_star_arguments.first() {
                    vec![MappedArgument::Argument((*double_star).clone())]
                } else if *default {
                    vec![MappedArgument::Default]
                } else {
                    errors.push(SignatureSelectionReason::MissingArgument(*name));
                    continue;
                };
                mapping.push((index, mapped));
            }
            CallableParameter::KeywordOnly { name, default, .. } => {
                let mapped = if let Some(position) = named
                    .iter()
                    .position(|argument| argument.name == Some(*name))
                {
                    vec![MappedArgument::Argument(named.remove(position).clone())]
                } else if let Some(double_star) = double_star_arguments.first() {
                    vec![MappedArgument::Argument((*double_star).clone())]
                } else if *default {
                    vec![MappedArgument::Default]
                } else {
                    errors.push(SignatureSelectionReason::MissingArgument(*name));
                    continue;
                };
                mapping.push((index, mapped));
            }
            CallableParameter::Variable(_) => {
                saw_star_parameter = true;
                let mut mapped: Vec<MappedArgument> = positional
                    .drain(..)
                    .map(|argument| MappedArgument::Argument(argument.clone()))
                    .collect();
                mapped.extend(
                    star_arguments
                        .iter()
                        .map(|argument| MappedArgument::Argument((*argument).clone())),
                );
                mapping.push((index, mapped));
            }
            CallableParameter::Keywords(_) => {
                saw_keywords_parameter = true;
                let mut mapped: Vec<MappedArgument> = named
                    .drain(..)
                    .map(|argument| MappedArgument::Argument(argument.clone()))
                    .collect();
                mapped.extend(
                    double_star_arguments
                        .iter()
                        .map(|argument| MappedArgument::Argument((*argument).clone())),
                );
                mapping.push((index, mapped));
            }
        }
    }

    if !positional.is_empty() && !saw_star_parameter {
        let expected = parameters
            .iter()
            .filter(|parameter| parameter.accepts_positional())
            .count();
        errors.push(SignatureSelectionReason::TooManyArguments {
            expected,
            provided: expected + positional.len(),
        });
    }
    if !saw_keywords_parameter {
        for argument in named {
            errors.push(SignatureSelectionReason::UnexpectedKeyword(
                argument.name.unwrap_or(names.self_parameter),
            ));
        }
    }

    (mapping, errors)
}
