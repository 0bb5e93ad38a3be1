//! Visitors that receive faces during rendering traversal.
//!
//! Visitors keep traversal independent of whatever consumes the faces: a
//! renderer batching draw calls, a test collecting indices, a debug overlay.

use crate::face::{Face, FaceIndex};

/// Receives each visible face during
/// [`World::traverse_for_rendering`](crate::World::traverse_for_rendering).
pub trait FaceVisitor {
    /// Called once per visible face, in tree pre-order.
    fn visit(&mut self, index: FaceIndex, face: &Face);
}

/// A visitor that records the indices of visited faces.
#[derive(Debug, Default)]
pub struct CollectingVisitor {
    collected: Vec<FaceIndex>,
}

impl CollectingVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the collected indices in visit order.
    pub fn indices(&self) -> &[FaceIndex] {
        &self.collected
    }

    pub fn into_indices(self) -> Vec<FaceIndex> {
        self.collected
    }
}

impl FaceVisitor for CollectingVisitor {
    fn visit(&mut self, index: FaceIndex, _face: &Face) {
        self.collected.push(index);
    }
}

/// A visitor that calls a closure for each face.
pub struct FnVisitor<F>
where
    F: FnMut(FaceIndex, &Face),
{
    func: F,
}

impl<F> FnVisitor<F>
where
    F: FnMut(FaceIndex, &Face),
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> FaceVisitor for FnVisitor<F>
where
    F: FnMut(FaceIndex, &Face),
{
    fn visit(&mut self, index: FaceIndex, face: &Face) {
        (self.func)(index, face);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::face::MaterialId;
    use nalgebra::Point3;

    fn make_face(material: u32) -> Face {
        Face::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            MaterialId(material),
        )
    }

    #[test]
    fn collecting_visitor_empty() {
        let visitor = CollectingVisitor::new();
        assert!(visitor.indices().is_empty());
    }

    #[test]
    fn collecting_visitor_keeps_order() {
        let mut visitor = CollectingVisitor::new();
        let face = make_face(0);
        visitor.visit(4, &face);
        visitor.visit(1, &face);

        assert_eq!(visitor.into_indices(), vec![4, 1]);
    }

    #[test]
    fn fn_visitor_calls_closure() {
        let mut materials = Vec::new();
        {
            let mut visitor = FnVisitor::new(|_, face: &Face| materials.push(face.material));
            visitor.visit(0, &make_face(2));
            visitor.visit(1, &make_face(5));
        }
        assert_eq!(materials, vec![MaterialId(2), MaterialId(5)]);
    }
}
