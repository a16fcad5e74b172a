// SPDX-License-Identifier: MIT

//! Standard functions, operators and constants

use super::evaluator::EvalError;
use super::registry::{Args, FunctionSignature, Output, Registry};

/// Precedence ranks, tightest first
pub mod rank {
    pub const PREFIX: u8 = 0;
    pub const MULTIPLICATIVE: u8 = 1;
    pub const ADDITIVE: u8 = 2;
    pub const RELATIONAL: u8 = 3;
    pub const EQUALITY: u8 = 4;
    pub const AND: u8 = 5;
    pub const OR: u8 = 6;
}

pub(crate) fn install(registry: &mut Registry) {
    install_functions(registry);
    install_operators(registry);

    registry.register_constant("true", 1.0);
    registry.register_constant("false", 0.0);
    registry.register_constant("pi", std::f64::consts::PI);
    registry.register_constant("e", std::f64::consts::E);
}

fn install_functions(registry: &mut Registry) {
    registry.register_function(FunctionSignature::variadic("min", 1, |a| {
        Ok(a.all().fold(f64::INFINITY, f64::min).into())
    }));
    registry.register_function(FunctionSignature::variadic("max", 1, |a| {
        Ok(a.all().fold(f64::NEG_INFINITY, f64::max).into())
    }));
    registry.register_function(FunctionSignature::new("clamp", 3, clamp));
    registry.register_function(unary("abs", f64::abs));
    registry.register_function(unary("sin", f64::sin));
    registry.register_function(unary("cos", f64::cos));
    registry.register_function(unary("tan", f64::tan));
    registry.register_function(unary("floor", f64::floor));
    registry.register_function(unary("ceil", f64::ceil));
    registry.register_function(unary("round", f64::round));
    registry.register_function(FunctionSignature::new("sign", 1, |a| {
        let v = a.get(0);
        let sign = if v == 0.0 { 0.0 } else { v.signum() };
        Ok(sign.into())
    }));
    registry.register_function(FunctionSignature::new("sqrt", 1, |a| {
        let v = a.get(0);
        if v < 0.0 {
            return Err(EvalError::domain("sqrt", format!("negative argument {v}")));
        }
        Ok(v.sqrt().into())
    }));
    registry.register_function(FunctionSignature::new("pow", 2, |a| {
        Ok(a.get(0).powf(a.get(1)).into())
    }));
}

fn install_operators(registry: &mut Registry) {
    registry.insert_operator("!", rank::PREFIX, FunctionSignature::new("!", 1, |a| {
        Ok((a.get(0) == 0.0).into())
    }));

    registry.insert_operator("*", rank::MULTIPLICATIVE, binary("*", |l, r| Ok((l * r).into())));
    registry.insert_operator("/", rank::MULTIPLICATIVE, binary("/", divide));
    registry.insert_operator("//", rank::MULTIPLICATIVE, binary("//", real_divide));
    registry.insert_operator("%", rank::MULTIPLICATIVE, binary("%", remainder));

    registry.insert_operator("+", rank::ADDITIVE, binary("+", |l, r| Ok((l + r).into())));
    registry.insert_operator("-", rank::ADDITIVE, binary("-", |l, r| Ok((l - r).into())));

    registry.insert_operator("<", rank::RELATIONAL, binary("<", |l, r| Ok((l < r).into())));
    registry.insert_operator("<=", rank::RELATIONAL, binary("<=", |l, r| Ok((l <= r).into())));
    registry.insert_operator(">", rank::RELATIONAL, binary(">", |l, r| Ok((l > r).into())));
    registry.insert_operator(">=", rank::RELATIONAL, binary(">=", |l, r| Ok((l >= r).into())));

    registry.insert_operator("==", rank::EQUALITY, binary("==", |l, r| Ok((l == r).into())));
    registry.insert_operator("!=", rank::EQUALITY, binary("!=", |l, r| Ok((l != r).into())));

    registry.insert_operator("&&", rank::AND, binary("&&", |l, r| {
        Ok((l != 0.0 && r != 0.0).into())
    }));
    registry.insert_operator("||", rank::OR, binary("||", |l, r| {
        Ok((l != 0.0 || r != 0.0).into())
    }));
}

fn unary(name: &str, f: fn(f64) -> f64) -> FunctionSignature {
    FunctionSignature::new(name, 1, move |a| Ok(f(a.get(0)).into()))
}

fn binary(name: &str, f: fn(f64, f64) -> Result<Output, EvalError>) -> FunctionSignature {
    FunctionSignature::new(name, 2, move |a| f(a.get(0), a.get(1)))
}

fn clamp(a: Args<'_>) -> Result<Output, EvalError> {
    let (value, lo, hi) = (a.get(0), a.get(1), a.get(2));
    if lo > hi {
        return Err(EvalError::domain(
            "clamp",
            format!("lower bound {lo} is greater than upper bound {hi}"),
        ));
    }
    Ok(value.max(lo).min(hi).into())
}

fn is_integral(v: f64) -> bool {
    v.is_finite() && v.fract() == 0.0
}

/// Integer division for two integral operands, real division otherwise
fn divide(l: f64, r: f64) -> Result<Output, EvalError> {
    if r == 0.0 {
        return Err(EvalError::division_by_zero("/"));
    }
    if is_integral(l) && is_integral(r) {
        Ok((l / r).trunc().into())
    } else {
        Ok((l / r).into())
    }
}

fn real_divide(l: f64, r: f64) -> Result<Output, EvalError> {
    if r == 0.0 {
        return Err(EvalError::division_by_zero("//"));
    }
    Ok((l / r).into())
}

fn remainder(l: f64, r: f64) -> Result<Output, EvalError> {
    if r == 0.0 {
        return Err(EvalError::division_by_zero("%"));
    }
    Ok((l % r).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(registry: &Registry, name: &str, args: &[f64]) -> Result<f64, EvalError> {
        let f = registry.lookup_function(name).unwrap();
        let (fixed, rest) = args.split_at(f.arity());
        f.invoke(Args { fixed, rest }).map(Output::to_number)
    }

    fn op(registry: &Registry, symbol: &str, args: &[f64]) -> Result<f64, EvalError> {
        let op = registry.lookup_operator(symbol).unwrap();
        op.function()
            .invoke(Args {
                fixed: args,
                rest: &[],
            })
            .map(Output::to_number)
    }

    #[test]
    fn test_builtin_functions_present() {
        let registry = Registry::builtin();
        for name in ["min", "max", "clamp", "abs", "sin", "cos", "tan"] {
            assert!(registry.lookup_function(name).is_some(), "missing {name}");
        }
        assert!(registry.lookup_function("min").unwrap().is_variadic());
        assert!(!registry.lookup_function("clamp").unwrap().is_variadic());
    }

    #[test]
    fn test_min_max() {
        let registry = Registry::builtin();
        assert_eq!(call(&registry, "min", &[3.0, 1.0, 2.0]), Ok(1.0));
        assert_eq!(call(&registry, "max", &[3.0, 1.0, 2.0]), Ok(3.0));
        assert_eq!(call(&registry, "min", &[-4.0]), Ok(-4.0));
    }

    #[test]
    fn test_clamp() {
        let registry = Registry::builtin();
        assert_eq!(call(&registry, "clamp", &[5.0, 0.0, 3.0]), Ok(3.0));
        assert_eq!(call(&registry, "clamp", &[-1.0, 0.0, 3.0]), Ok(0.0));
        assert_eq!(call(&registry, "clamp", &[2.0, 0.0, 3.0]), Ok(2.0));
        assert!(matches!(
            call(&registry, "clamp", &[2.0, 3.0, 0.0]),
            Err(EvalError::Domain { .. })
        ));
    }

    #[test]
    fn test_precedence_ranks() {
        let registry = Registry::builtin();
        let rank_of = |s: &str| registry.lookup_operator(s).unwrap().precedence();

        assert_eq!(rank_of("!"), 0);
        for s in ["*", "/", "//", "%"] {
            assert_eq!(rank_of(s), 1);
        }
        assert_eq!(rank_of("+"), 2);
        assert_eq!(rank_of("-"), 2);
        for s in ["<", "<=", ">", ">="] {
            assert_eq!(rank_of(s), 3);
        }
        assert_eq!(rank_of("=="), 4);
        assert_eq!(rank_of("!="), 4);
        assert_eq!(rank_of("&&"), 5);
        assert_eq!(rank_of("||"), 6);
    }

    #[test]
    fn test_division_convention() {
        let registry = Registry::builtin();
        assert_eq!(op(&registry, "/", &[6.0, 4.0]), Ok(1.0));
        assert_eq!(op(&registry, "/", &[-7.0, 2.0]), Ok(-3.0));
        assert_eq!(op(&registry, "//", &[6.0, 4.0]), Ok(1.5));
        assert_eq!(op(&registry, "/", &[6.5, 4.0]), Ok(1.625));
        assert_eq!(op(&registry, "%", &[7.0, 4.0]), Ok(3.0));
    }

    #[test]
    fn test_division_by_zero() {
        let registry = Registry::builtin();
        for symbol in ["/", "//", "%"] {
            assert_eq!(
                op(&registry, symbol, &[1.0, 0.0]),
                Err(EvalError::division_by_zero(symbol))
            );
        }
        assert!(op(&registry, "/", &[1.5, 0.0]).is_err());
    }

    #[test]
    fn test_logical_operators() {
        let registry = Registry::builtin();
        assert_eq!(op(&registry, "&&", &[2.0, -1.0]), Ok(1.0));
        assert_eq!(op(&registry, "&&", &[2.0, 0.0]), Ok(0.0));
        assert_eq!(op(&registry, "||", &[0.0, 0.0]), Ok(0.0));
        assert_eq!(op(&registry, "||", &[0.0, 3.0]), Ok(1.0));
        assert_eq!(op(&registry, "!", &[0.0]), Ok(1.0));
        assert_eq!(op(&registry, "!", &[-5.0]), Ok(0.0));
    }

    #[test]
    fn test_sqrt_domain() {
        let registry = Registry::builtin();
        assert_eq!(call(&registry, "sqrt", &[9.0]), Ok(3.0));
        assert!(matches!(
            call(&registry, "sqrt", &[-1.0]),
            Err(EvalError::Domain { .. })
        ));
    }
}
