//! Operator overloads for `Vector` and `Matrix`.
//!
//! Compound assignment (`+=`, `-=`, `*=`, `/=`, `^=`) mutates the left view in
//! place, so every alias of it observes the change. Binary operators on
//! references deep-clone the left operand first and never touch their
//! inputs. `^` is elementwise power.
use std::ops::{
    Add, AddAssign, BitXor, BitXorAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign,
};

use crate::math::{Matrix, Vector};

macro_rules! binary_op {
    (
        $t:ty,
        $tr:ident,
        $method:ident,
        $tr_assign:ident,
        $method_assign:ident,
        $inplace:ident,
        $scalar:ident
    ) => {
        impl $tr_assign<&$t> for $t {
            #[track_caller]
            fn $method_assign(&mut self, rhs: &$t) {
                self.$inplace(rhs);
            }
        }

        impl $tr_assign<f32> for $t {
            fn $method_assign(&mut self, rhs: f32) {
                self.$scalar(rhs);
            }
        }

        impl $tr<&$t> for &$t {
            type Output = $t;

            #[track_caller]
            fn $method(self, rhs: &$t) -> $t {
                let out = self.deep_clone();
                out.$inplace(rhs);
                out
            }
        }

        impl $tr<f32> for &$t {
            type Output = $t;

            fn $method(self, rhs: f32) -> $t {
                let out = self.deep_clone();
                out.$scalar(rhs);
                out
            }
        }
    };
}

macro_rules! scalar_lhs_op {
    ($t:ty, $tr:ident, $method:ident, $inplace:ident) => {
        impl $tr<&$t> for f32 {
            type Output = $t;

            fn $method(self, rhs: &$t) -> $t {
                let out = rhs.deep_clone();
                out.$inplace(self);
                out
            }
        }
    };
}

macro_rules! elementwise_ops {
    ($t:ty) => {
        binary_op!($t, Add, add, AddAssign, add_assign, add_inplace, add_scalar_inplace);
        binary_op!($t, Sub, sub, SubAssign, sub_assign, sub_inplace, sub_scalar_inplace);
        binary_op!($t, Mul, mul, MulAssign, mul_assign, mul_inplace, mul_scalar_inplace);
        binary_op!($t, Div, div, DivAssign, div_assign, div_inplace, div_scalar_inplace);
        binary_op!(
            $t,
            BitXor,
            bitxor,
            BitXorAssign,
            bitxor_assign,
            pow_inplace,
            pow_scalar_inplace
        );

        scalar_lhs_op!($t, Add, add, add_scalar_inplace);
        scalar_lhs_op!($t, Mul, mul, mul_scalar_inplace);
        // value - v == -v + value
        scalar_lhs_op!($t, Sub, sub, rsub_scalar_inplace);
        scalar_lhs_op!($t, Div, div, rdiv_scalar_inplace);
        scalar_lhs_op!($t, BitXor, bitxor, rpow_scalar_inplace);

        impl Neg for &$t {
            type Output = $t;

            fn neg(self) -> $t {
                let out = self.deep_clone();
                out.neg_inplace();
                out
            }
        }
    };
}

elementwise_ops!(Vector);
elementwise_ops!(Matrix);
