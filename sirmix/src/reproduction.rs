use crate::error::{ensure_rate, ModelError};
use crate::model::sir_mix::{InitialState, ModelParameters};

/// R0 = beta / gamma for a fully susceptible, non-distancing population.
pub fn basic_reproduction_number(beta: f64, gamma: f64) -> Result<f64, ModelError> {
    ensure_rate("beta", beta)?;
    ensure_rate("gamma", gamma)?;
    if gamma == 0.0 {
        return Err(ModelError::ZeroRate { name: "gamma" });
    }
    Ok(beta / gamma)
}

/// Contact rate that yields a target R0 for mean infectious duration 1/gamma.
pub fn beta_from_r0(r0: f64, gamma: f64) -> Result<f64, ModelError> {
    ensure_rate("r0", r0)?;
    ensure_rate("gamma", gamma)?;
    Ok(r0 * gamma)
}

/// Reproduction number at t = 0 once distancing is in place:
/// (beta / gamma) * (f * q + (1 - f)) * S(0) / N, with f the compliant fraction.
pub fn effective_reproduction_number(
    params: &ModelParameters,
    initial: &InitialState,
) -> Result<f64, ModelError> {
    let r0 = basic_reproduction_number(params.beta, params.gamma)?;
    let f = initial.compliant_fraction;
    let mixing = f * params.q + (1.0 - f);
    Ok(r0 * mixing * initial.susceptible_fraction())
}
