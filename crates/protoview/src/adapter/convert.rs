//! Conversion of method results to their declared types

use std::sync::Arc;

use super::decoration::ViewDecoration;
use super::view::{create_view, ViewGraph};
use crate::reflect::{ContainerKind, GenericRaw, Type, Value};
use crate::{AdapterError, AdapterResult};

/// Convert `value` to `target`, adapting objects to views in `graph`.
///
/// Containers are rebuilt with converted elements, keeping their order.
/// Scalars and values declared as `Object` pass through unchanged.
pub(crate) fn convert(
    target: &Type,
    value: Value,
    decoration: &ViewDecoration,
    graph: &Arc<ViewGraph>,
) -> AdapterResult<Value> {
    let value = match value {
        Value::Lazy(supplier) => return convert(target, supplier()?, decoration, graph),
        Value::Null => return Ok(Value::Null),
        other => other,
    };

    match target {
        Type::Parameterized {
            raw: GenericRaw::Container(kind),
            args,
        } => {
            if kind.is_iterable() {
                let element = type_argument(args, 0);
                convert_collection(target, *kind, &element, value, decoration, graph)
            } else {
                let key = type_argument(args, 0);
                let entry = type_argument(args, 1);
                convert_map(target, &key, &entry, value, decoration, graph)
            }
        }
        Type::Void | Type::Scalar(_) | Type::Object => Ok(value),
        Type::Container(kind) => {
            if has_container_shape(*kind, &value) {
                Ok(value)
            } else {
                Err(unsupported(&value, target))
            }
        }
        Type::Class(handle) => match handle.upgrade() {
            Some(class) => create_view(&class, value, decoration, graph),
            None => Err(unsupported(&value, target)),
        },
        Type::Array(element) => {
            convert_collection(target, ContainerKind::List, element, value, decoration, graph)
        }
        Type::Parameterized { .. } | Type::Wildcard { .. } | Type::Variable(_) => {
            Err(unsupported(&value, target))
        }
    }
}

/// Type argument `index`, with wildcards replaced by their upper bound
fn type_argument(args: &[Type], index: usize) -> Type {
    match args.get(index) {
        Some(Type::Wildcard { upper, .. }) => upper.first().cloned().unwrap_or(Type::Object),
        Some(arg) => arg.clone(),
        None => Type::Object,
    }
}

fn has_container_shape(kind: ContainerKind, value: &Value) -> bool {
    match kind {
        ContainerKind::Map => matches!(value, Value::Map(_)),
        ContainerKind::List => matches!(value, Value::List(_)),
        ContainerKind::Set => matches!(value, Value::Set(_)),
        ContainerKind::DomainObjectSet => matches!(value, Value::DomainObjectSet(_)),
        ContainerKind::Iterable | ContainerKind::Collection => value.elements().is_some(),
    }
}

fn convert_collection(
    target: &Type,
    kind: ContainerKind,
    element: &Type,
    value: Value,
    decoration: &ViewDecoration,
    graph: &Arc<ViewGraph>,
) -> AdapterResult<Value> {
    let elements = value.elements().ok_or_else(|| unsupported(&value, target))?;
    let converted = elements
        .iter()
        .map(|e| convert(element, e.clone(), decoration, graph))
        .collect::<AdapterResult<Vec<_>>>()?;
    Ok(match kind {
        ContainerKind::Set => Value::set(converted),
        ContainerKind::DomainObjectSet => Value::domain_object_set(converted),
        _ => Value::List(converted),
    })
}

fn convert_map(
    target: &Type,
    key: &Type,
    entry: &Type,
    value: Value,
    decoration: &ViewDecoration,
    graph: &Arc<ViewGraph>,
) -> AdapterResult<Value> {
    let entries = value.entries().ok_or_else(|| unsupported(&value, target))?;
    let converted = entries
        .iter()
        .map(|(k, v)| {
            Ok((
                convert(key, k.clone(), decoration, graph)?,
                convert(entry, v.clone(), decoration, graph)?,
            ))
        })
        .collect::<AdapterResult<Vec<_>>>()?;
    Ok(Value::map(converted))
}

fn unsupported(value: &Value, target: &Type) -> AdapterError {
    AdapterError::UnsupportedConversion {
        source_type: value.type_name(),
        target_type: target.to_string(),
    }
}
