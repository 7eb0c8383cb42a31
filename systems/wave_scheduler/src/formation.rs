use bulwark_core::{Formation, Position};
use glam::Vec2;
use rand::Rng;

/// Radius of the scatter around a clustered group's anchor.
const CLUSTER_SPREAD: f32 = 40.0;
/// Distance between neighbouring ranks of a V formation.
const V_SPACING: f32 = 24.0;

/// Produces successive spawn points for one enemy group.
#[derive(Clone, Copy, Debug)]
pub(crate) struct FormationCursor {
    formation: Formation,
    anchor: Position,
    heading: Vec2,
    bounds: (f32, f32),
    index: u32,
}

impl FormationCursor {
    /// Picks the group's anchor on the world's edge, facing `objective`.
    pub(crate) fn new<R: Rng + ?Sized>(
        formation: Formation,
        bounds: (f32, f32),
        objective: Position,
        rng: &mut R,
    ) -> Self {
        let anchor = edge_point(bounds, rng);
        let heading = (Vec2::from(objective) - Vec2::from(anchor)).normalize_or_zero();
        Self {
            formation,
            anchor,
            heading,
            bounds,
            index: 0,
        }
    }

    /// Next spawn point of the group.
    pub(crate) fn next_point<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Position {
        let index = self.index;
        self.index = self.index.saturating_add(1);
        match self.formation {
            Formation::Random => edge_point(self.bounds, rng),
            Formation::Clustered => {
                let angle = rng.gen_range(0.0..std::f32::consts::TAU);
                let distance = CLUSTER_SPREAD * rng.gen::<f32>().sqrt();
                let offset = Vec2::from_angle(angle) * distance;
                self.clamp(Vec2::from(self.anchor) + offset)
            }
            Formation::VFormation => {
                let rank = ((index + 1) / 2) as f32;
                let side = if index % 2 == 1 { 1.0 } else { -1.0 };
                let across = self.heading.perp() * side * rank * V_SPACING;
                let behind = -self.heading * rank * V_SPACING;
                self.clamp(Vec2::from(self.anchor) + behind + across)
            }
        }
    }

    fn clamp(&self, point: Vec2) -> Position {
        let (width, height) = self.bounds;
        Position::new(point.x.max(0.0).min(width), point.y.max(0.0).min(height))
    }
}

/// Uniformly random point on the perimeter of a `width` by `height` world.
fn edge_point<R: Rng + ?Sized>(bounds: (f32, f32), rng: &mut R) -> Position {
    let (width, height) = bounds;
    let perimeter = 2.0 * (width + height);
    if !(perimeter.is_finite() && perimeter > 0.0) {
        return Position::default();
    }
    let mut t = rng.gen_range(0.0..perimeter);
    if t < width {
        return Position::new(t, 0.0);
    }
    t -= width;
    if t < height {
        return Position::new(width, t);
    }
    t -= height;
    if t < width {
        return Position::new(width - t, height);
    }
    t -= width;
    Position::new(0.0, height - t)
}
