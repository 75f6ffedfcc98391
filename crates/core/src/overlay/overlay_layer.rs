use crate::overlay::highlight_shape::HighlightShape;

/// What one replacement did to the layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct LayerChange {
    pub removed: usize,
    pub added: usize,
}

/// The highlight shapes currently drawn over the preview.
///
/// Only the UI thread mutates it. Every update removes all previous shapes
/// before the new ones go in.
#[derive(Debug, Default)]
pub struct OverlayLayer {
    shapes: Vec<HighlightShape>,
    generation: u64,
}

impl OverlayLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace_all(&mut self, shapes: Vec<HighlightShape>) -> LayerChange {
        let removed = self.clear();
        let added = shapes.len();
        self.shapes.extend(shapes);
        LayerChange { removed, added }
    }

    /// Removes every shape and returns how many there were.
    pub fn clear(&mut self) -> usize {
        let removed = self.shapes.len();
        self.shapes.clear();
        self.generation += 1;
        removed
    }

    pub fn shapes(&self) -> &[HighlightShape] {
        &self.shapes
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Bumped on every update, so renderers can tell when to redraw.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::highlight_shape::StrokeStyle;
    use crate::shared::geometry::ScreenRect;

    fn shapes(n: usize) -> Vec<HighlightShape> {
        (0..n)
            .map(|i| {
                HighlightShape::new(
                    ScreenRect::new(i as f64, 0.0, 10.0, 10.0),
                    StrokeStyle::default(),
                )
            })
            .collect()
    }

    #[test]
    fn test_replace_all_drops_previous_shapes() {
        let mut layer = OverlayLayer::new();
        assert_eq!(layer.replace_all(shapes(3)), LayerChange { removed: 0, added: 3 });
        assert_eq!(layer.replace_all(shapes(1)), LayerChange { removed: 3, added: 1 });
        assert_eq!(layer.len(), 1);
        assert_eq!(layer.shapes()[0].rect.x, 0.0);
    }

    #[test]
    fn test_empty_replacement_clears() {
        let mut layer = OverlayLayer::new();
        layer.replace_all(shapes(2));
        assert_eq!(layer.replace_all(Vec::new()), LayerChange { removed: 2, added: 0 });
        assert!(layer.is_empty());
    }

    #[test]
    fn test_generation_advances_on_every_update() {
        let mut layer = OverlayLayer::new();
        let start = layer.generation();
        layer.replace_all(Vec::new());
        layer.clear();
        assert_eq!(layer.generation(), start + 2);
    }
}
