//! Bounded two-parameter Nelder–Mead simplex minimizer.
//!
//! RULE: the optimizer never aborts on a bad region. Objectives signal an
//! infeasible point by returning a large penalty value, and candidate
//! points are clamped into the bound box before evaluation, so the search
//! stays inside the feasible region by construction.
//!
//! Every call allocates its own simplex; concurrent fits share nothing.
//! On budget exhaustion the best vertex seen so far is returned, which is
//! what degenerate objective surfaces (e.g. near-uniform histograms) need.

// Standard Nelder–Mead coefficients.
const REFLECT:  f64 = 1.0;
const EXPAND:   f64 = 2.0;
const CONTRACT: f64 = 0.5;
const SHRINK:   f64 = 0.5;

/// Outcome of a minimization run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Minimum {
    pub point:      [f64; 2],
    pub value:      f64,
    pub iterations: usize,
    /// False when the iteration budget ran out before the simplex collapsed
    /// below tolerance; `point` is still the best seen.
    pub converged:  bool,
}

pub struct NelderMead {
    pub max_iterations: usize,
    pub tolerance:      f64,
    pub bounds:         [(f64, f64); 2],
}

impl NelderMead {
    pub fn new(max_iterations: usize, tolerance: f64, bounds: [(f64, f64); 2]) -> Self {
        Self { max_iterations, tolerance, bounds }
    }

    /// Minimize `objective` starting from `start`, which is clamped into
    /// the bound box first.
    pub fn minimize<F>(&self, objective: F, start: [f64; 2]) -> Minimum
    where
        F: Fn(&[f64; 2]) -> f64,
    {
        let start = self.clamp(start);

        // Initial simplex: start point plus one step along each axis,
        // step sized relative to the coordinate.
        let mut simplex: Vec<([f64; 2], f64)> = Vec::with_capacity(3);
        simplex.push((start, objective(&start)));
        for axis in 0..2 {
            let mut vertex = start;
            let step = (vertex[axis].abs() * 0.05).max(0.05);
            vertex[axis] += step;
            let vertex = self.clamp(vertex);
            simplex.push((vertex, objective(&vertex)));
        }

        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iterations {
            iterations += 1;

            simplex.sort_by(|a, b| {
                a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal)
            });

            let spread = (simplex[2].1 - simplex[0].1).abs();
            if spread <= self.tolerance {
                converged = true;
                break;
            }

            let best = simplex[0];
            let worst = simplex[2];

            // Centroid of all vertices but the worst.
            let centroid = [
                (simplex[0].0[0] + simplex[1].0[0]) / 2.0,
                (simplex[0].0[1] + simplex[1].0[1]) / 2.0,
            ];

            let reflected = self.clamp([
                centroid[0] + REFLECT * (centroid[0] - worst.0[0]),
                centroid[1] + REFLECT * (centroid[1] - worst.0[1]),
            ]);
            let reflected_value = objective(&reflected);

            if reflected_value < best.1 {
                // Try to go further in the same direction.
                let expanded = self.clamp([
                    centroid[0] + EXPAND * (reflected[0] - centroid[0]),
                    centroid[1] + EXPAND * (reflected[1] - centroid[1]),
                ]);
                let expanded_value = objective(&expanded);
                simplex[2] = if expanded_value < reflected_value {
                    (expanded, expanded_value)
                } else {
                    (reflected, reflected_value)
                };
                continue;
            }

            if reflected_value < simplex[1].1 {
                simplex[2] = (reflected, reflected_value);
                continue;
            }

            // Contract toward the centroid.
            let contracted = self.clamp([
                centroid[0] + CONTRACT * (worst.0[0] - centroid[0]),
                centroid[1] + CONTRACT * (worst.0[1] - centroid[1]),
            ]);
            let contracted_value = objective(&contracted);
            if contracted_value < worst.1 {
                simplex[2] = (contracted, contracted_value);
                continue;
            }

            // Shrink everything toward the best vertex.
            for vertex in simplex.iter_mut().skip(1) {
                let shrunk = self.clamp([
                    best.0[0] + SHRINK * (vertex.0[0] - best.0[0]),
                    best.0[1] + SHRINK * (vertex.0[1] - best.0[1]),
                ]);
                *vertex = (shrunk, objective(&shrunk));
            }
        }

        simplex.sort_by(|a, b| {
            a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal)
        });

        Minimum {
            point: simplex[0].0,
            value: simplex[0].1,
            iterations,
            converged,
        }
    }

    fn clamp(&self, point: [f64; 2]) -> [f64; 2] {
        [
            point[0].clamp(self.bounds[0].0, self.bounds[0].1),
            point[1].clamp(self.bounds[1].0, self.bounds[1].1),
        ]
    }
}
