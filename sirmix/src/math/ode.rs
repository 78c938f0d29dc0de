/// Simple fixed-step explicit (forward) Euler integrator for systems of ODEs.
/// State and derivative are represented as slices of f64.
pub fn euler_step<F>(y: &mut [f64], t: f64, dt: f64, f: F)
where
    F: FnMut(f64, &[f64], &mut [f64]),
{
    let mut ws = EulerWorkspace::new(y.len());
    euler_step_ws(y, t, dt, &mut ws, f);
}

/// Workspace for allocation-free Euler steps
#[derive(Debug, Clone)]
pub struct EulerWorkspace {
    pub dy: Vec<f64>,
}

impl EulerWorkspace {
    pub fn new(n: usize) -> Self {
        Self { dy: vec![0.0; n] }
    }

    pub fn resize(&mut self, n: usize) {
        if self.dy.len() != n {
            self.dy.resize(n, 0.0);
        }
    }
}

/// Fixed-step Euler using a preallocated workspace to avoid allocations per step.
/// The derivative is evaluated once at (t, y) and y is advanced in place by dt * dy.
pub fn euler_step_ws<F>(y: &mut [f64], t: f64, dt: f64, ws: &mut EulerWorkspace, mut f: F)
where
    F: FnMut(f64, &[f64], &mut [f64]),
{
    ws.resize(y.len());
    let dy = &mut ws.dy;

    f(t, y, dy);

    for (yi, dyi) in y.iter_mut().zip(dy.iter()) {
        *yi += dt * *dyi;
    }
}
