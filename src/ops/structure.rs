//!
//! Structural operators on `Repeat` nodes.

use crate::error::MutateError;
use crate::ops::SizeDelta;
use crate::tree::{Body, Node};
use crate::types::FieldKind;

/// Elements of a Repeat node, checked to be all scalar or all composite.
///
/// A Repeat mixing both would share one count field between two element
/// grammars; no operator supports that.
pub fn repeat_items_mut(node: &mut Node) -> Result<&mut Vec<Node>, MutateError> {
    let field = node.name;
    let Body::Repeat(items) = &mut node.body else {
        return Err(MutateError::NotApplicable { field, expected: FieldKind::Repeat });
    };
    if let Some(first) = items.first() {
        let scalar = first.is_scalar();
        if items.iter().any(|item| item.is_scalar() != scalar) {
            return Err(MutateError::MixedRepeat { field });
        }
    }
    Ok(items)
}

/// Inserts a copy of element `index` directly after it.
pub fn clone_element(node: &mut Node, index: usize) -> Result<SizeDelta, MutateError> {
    let items = repeat_items_mut(node)?;
    let item = items.get(index).ok_or_else(|| MutateError::InvalidPath(vec![index]))?.clone();
    let bytes = item.encoded_len() as isize;
    items.insert(index + 1, item);
    Ok(SizeDelta { bytes, count: 1 })
}

/// Removes element `index`.
pub fn delete_element(node: &mut Node, index: usize) -> Result<SizeDelta, MutateError> {
    let items = repeat_items_mut(node)?;
    if index >= items.len() {
        return Err(MutateError::InvalidPath(vec![index]));
    }
    let item = items.remove(index);
    Ok(SizeDelta { bytes: -(item.encoded_len() as isize), count: -1 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IntEncoding;

    fn values(node: &Node) -> Vec<u64> {
        (0..node.child_count())
            .filter_map(|i| match &node.child(i)?.body {
                Body::Int(int) => Some(int.value),
                _ => None,
            })
            .collect()
    }

    fn bytes_repeat(values: &[u64]) -> Node {
        let items = values.iter().map(|v| Node::int("item", IntEncoding::UINT8, *v)).collect();
        Node::new("entries", Body::Repeat(items))
    }

    #[test]
    fn clone_duplicates_in_place() {
        let mut node = bytes_repeat(&[10, 20, 30]);
        let delta = clone_element(&mut node, 1).unwrap();
        assert_eq!(values(&node), vec![10, 20, 20, 30]);
        assert_eq!(delta, SizeDelta { bytes: 1, count: 1 });
    }

    #[test]
    fn delete_removes_one() {
        let mut node = bytes_repeat(&[10, 20, 30]);
        let delta = delete_element(&mut node, 1).unwrap();
        assert_eq!(values(&node), vec![10, 30]);
        assert_eq!(delta, SizeDelta { bytes: -1, count: -1 });
    }

    #[test]
    fn composite_elements_carry_their_full_size() {
        let entry = Node::new(
            "item",
            Body::Struct(vec![
                Node::int("a", IntEncoding::VARUINT32, 300),
                Node::bytes("b", vec![1, 2, 3]),
            ]),
        );
        let mut node = Node::new("entries", Body::Repeat(vec![entry]));
        assert_eq!(clone_element(&mut node, 0).unwrap(), SizeDelta { bytes: 5, count: 1 });
        assert_eq!(delete_element(&mut node, 1).unwrap(), SizeDelta { bytes: -5, count: -1 });
    }

    #[test]
    fn rejects_mixed_and_out_of_range() {
        let mut mixed = Node::new(
            "entries",
            Body::Repeat(vec![Node::int("item", IntEncoding::UINT8, 1), Node::bytes("item", vec![2])]),
        );
        assert_eq!(clone_element(&mut mixed, 0), Err(MutateError::MixedRepeat { field: "entries" }));

        let mut node = bytes_repeat(&[1]);
        assert_eq!(delete_element(&mut node, 1), Err(MutateError::InvalidPath(vec![1])));
        let mut bytes = Node::bytes("b", vec![1]);
        assert!(matches!(
            clone_element(&mut bytes, 0),
            Err(MutateError::NotApplicable { expected: FieldKind::Repeat, .. })
        ));
    }
}
