//! Derivative-free minimisation for the likelihood fit.

/// Result of a Nelder-Mead minimisation.
#[derive(Debug, Clone)]
pub struct Minimum {
    pub point: Vec<f64>,
    pub value: f64,
    pub n_iters: usize,
    pub converged: bool,
}

/// Nelder-Mead settings.
#[derive(Debug, Clone)]
pub struct NelderMead {
    pub max_iters: usize,
    /// Absolute tolerance on the spread of objective values in the simplex.
    pub f_tol: f64,
    /// Absolute tolerance on the size of the simplex.
    pub x_tol: f64,
    /// Relative size of the initial simplex steps.
    pub initial_step: f64,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self {
            max_iters: 2000,
            f_tol: 1e-10,
            x_tol: 1e-10,
            initial_step: 0.05,
        }
    }
}

const REFLECT: f64 = 1.0;
const EXPAND: f64 = 2.0;
const CONTRACT: f64 = 0.5;
const SHRINK: f64 = 0.5;

impl NelderMead {
    /// Minimise `objective` starting from `initial`.
    pub fn minimize<F>(&self, objective: F, initial: &[f64]) -> Minimum
    where
        F: Fn(&[f64]) -> f64,
    {
        let n_dims = initial.len();
        if n_dims == 0 {
            return Minimum {
                point: Vec::new(),
                value: f64::NAN,
                n_iters: 0,
                converged: false,
            };
        }

        let mut simplex = Vec::with_capacity(n_dims + 1);
        simplex.push(initial.to_vec());
        for i_dim in 0..n_dims {
            let mut vertex = initial.to_vec();
            vertex[i_dim] += if initial[i_dim].abs() > 1e-10 {
                self.initial_step * initial[i_dim].abs()
            } else {
                self.initial_step
            };
            simplex.push(vertex);
        }
        let mut values: Vec<f64> = simplex.iter().map(|vertex| objective(vertex)).collect();

        let mut n_iters = 0;
        let mut converged = false;
        while n_iters < self.max_iters {
            n_iters += 1;

            // Order vertices from best to worst, NaN last.
            let mut order: Vec<usize> = (0..=n_dims).collect();
            order.sort_by(|&a, &b| nan_last(values[a]).total_cmp(&nan_last(values[b])));
            simplex = order.iter().map(|&idx| simplex[idx].clone()).collect();
            values = order.iter().map(|&idx| values[idx]).collect();

            let f_spread = values[n_dims] - values[0];
            let x_spread = simplex[1..]
                .iter()
                .flat_map(|vertex| vertex.iter().zip(&simplex[0]).map(|(a, b)| (a - b).abs()))
                .fold(0.0, f64::max);
            if f_spread.abs() <= self.f_tol && x_spread <= self.x_tol {
                converged = true;
                break;
            }

            let centroid = centroid(&simplex[..n_dims]);
            let worst = &simplex[n_dims];

            let reflected = lerp(&centroid, worst, -REFLECT);
            let reflected_value = objective(&reflected);

            if reflected_value < values[0] {
                let expanded = lerp(&centroid, worst, -REFLECT * EXPAND);
                let expanded_value = objective(&expanded);
                if expanded_value < reflected_value {
                    simplex[n_dims] = expanded;
                    values[n_dims] = expanded_value;
                } else {
                    simplex[n_dims] = reflected;
                    values[n_dims] = reflected_value;
                }
                continue;
            }

            if reflected_value < values[n_dims - 1] {
                simplex[n_dims] = reflected;
                values[n_dims] = reflected_value;
                continue;
            }

            let (contracted, threshold) = if reflected_value < values[n_dims] {
                (lerp(&centroid, worst, -REFLECT * CONTRACT), reflected_value)
            } else {
                (lerp(&centroid, worst, CONTRACT), values[n_dims])
            };
            let contracted_value = objective(&contracted);
            if contracted_value <= threshold {
                simplex[n_dims] = contracted;
                values[n_dims] = contracted_value;
                continue;
            }

            let best = simplex[0].clone();
            for idx in 1..=n_dims {
                simplex[idx] = lerp(&best, &simplex[idx], SHRINK);
                values[idx] = objective(&simplex[idx]);
            }
        }

        let i_best = (0..=n_dims)
            .min_by(|&a, &b| nan_last(values[a]).total_cmp(&nan_last(values[b])))
            .unwrap_or(0);

        Minimum {
            point: simplex[i_best].clone(),
            value: values[i_best],
            n_iters,
            converged,
        }
    }
}

fn nan_last(val: f64) -> f64 {
    if val.is_nan() { f64::INFINITY } else { val }
}

fn centroid(vertices: &[Vec<f64>]) -> Vec<f64> {
    let n_vertices = vertices.len() as f64;
    let mut centroid = vec![0.0; vertices[0].len()];
    for vertex in vertices {
        for (sum, val) in centroid.iter_mut().zip(vertex) {
            *sum += val;
        }
    }
    centroid.iter_mut().for_each(|sum| *sum /= n_vertices);
    centroid
}

/// Point `origin + t * (target - origin)`.
fn lerp(origin: &[f64], target: &[f64], t: f64) -> Vec<f64> {
    origin
        .iter()
        .zip(target)
        .map(|(o, p)| o + t * (p - o))
        .collect()
}
