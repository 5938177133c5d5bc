//! Conversions to and from `ndarray`, and serde support.
use ndarray::{Array1, Array2};
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::error::fail;
use crate::math::{Matrix, Vector};

impl From<&Array1<f32>> for Vector {
    fn from(a: &Array1<f32>) -> Self {
        a.iter().copied().collect()
    }
}

impl From<&Array2<f32>> for Matrix {
    fn from(a: &Array2<f32>) -> Self {
        match Matrix::from_shape_vec(a.dim(), a.iter().copied().collect()) {
            Ok(m) => m,
            Err(err) => fail(err),
        }
    }
}

impl Vector {
    /// Owned `ndarray` copy.
    pub fn to_ndarray(&self) -> Array1<f32> {
        Array1::from_vec(self.to_vec())
    }
}

impl Matrix {
    /// Owned `ndarray` copy in logical order.
    pub fn to_ndarray(&self) -> Array2<f32> {
        Array2::from_shape_fn(self.shape(), |(i, j)| self.get(i, j))
    }
}

impl Serialize for Vector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for Vector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<f32>::deserialize(deserializer).map(Vector::from_vec)
    }
}

#[derive(Serialize, Deserialize)]
struct MatrixRepr {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl Serialize for Matrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        MatrixRepr {
            rows: self.rows(),
            cols: self.cols(),
            data: self.to_vec(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Matrix {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = MatrixRepr::deserialize(deserializer)?;
        Matrix::from_shape_vec((repr.rows, repr.cols), repr.data).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn ndarray_round_trip_keeps_logical_order() {
        let a = array![[1.0f32, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let m = Matrix::from(&a);
        assert_eq!(m.transpose().to_ndarray(), a.t());
    }

    #[test]
    fn transposed_matrix_serialises_logically() {
        let m = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let json = serde_json::to_string(&m.transpose()).unwrap();
        assert_eq!(json, r#"{"rows":2,"cols":2,"data":[1.0,3.0,2.0,4.0]}"#);
    }

    #[test]
    fn deserialising_checks_the_shape() {
        let err = serde_json::from_str::<Matrix>(r#"{"rows":2,"cols":2,"data":[1.0]}"#)
            .unwrap_err()
            .to_string();
        assert!(err.contains("shape mismatch in from_shape_vec"));
    }
}
