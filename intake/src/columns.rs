//! Arrow column extraction helpers.
//!
//! Every helper takes a column by name so that type errors can point at the
//! offending feature.

use arrow::array::{Array, AsArray, RecordBatch};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use ordered_float::OrderedFloat;

use crate::error::{PreprocError, Result};
use crate::vocab::CategoryValue;

/// Look up a named column, failing with [`PreprocError::MissingColumn`].
pub fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a dyn Array> {
    batch
        .column_by_name(name)
        .map(|c| c.as_ref())
        .ok_or_else(|| PreprocError::MissingColumn(name.to_string()))
}

fn is_numeric(data_type: &DataType) -> bool {
    data_type.is_numeric() || *data_type == DataType::Boolean
}

/// Cast a scalar numeric (or boolean) column to `f64`. Nulls become `NaN`.
pub fn numeric_values(name: &str, array: &dyn Array) -> Result<Vec<f64>> {
    if !is_numeric(array.data_type()) {
        return Err(PreprocError::UnsupportedType {
            column: name.to_string(),
            data_type: array.data_type().clone(),
        });
    }
    let cast = cast(array, &DataType::Float64)?;
    Ok(cast
        .as_primitive::<Float64Type>()
        .iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

/// Number of output slots an embedding column of this type occupies: 1 for a
/// scalar column, the list length for a fixed-size list column.
pub fn embedding_width(name: &str, data_type: &DataType) -> Result<usize> {
    match data_type {
        DataType::FixedSizeList(field, len) if is_numeric(field.data_type()) => Ok(*len as usize),
        dt if is_numeric(dt) => Ok(1),
        dt => Err(PreprocError::UnsupportedType {
            column: name.to_string(),
            data_type: dt.clone(),
        }),
    }
}

/// Flatten an embedding column into row-major `[num_rows, width]` values.
/// Null rows and null elements become `NaN`.
pub fn embedding_values(name: &str, array: &dyn Array) -> Result<(usize, Vec<f64>)> {
    let width = embedding_width(name, array.data_type())?;
    if !matches!(array.data_type(), DataType::FixedSizeList(..)) {
        return Ok((1, numeric_values(name, array)?));
    }

    let list = array.as_fixed_size_list();
    let child = cast(list.values().as_ref(), &DataType::Float64)?;
    let child = child.as_primitive::<Float64Type>();

    let mut out = Vec::with_capacity(list.len() * width);
    for row in 0..list.len() {
        if list.is_null(row) {
            out.extend(std::iter::repeat_n(f64::NAN, width));
            continue;
        }
        let start = list.value_offset(row) as usize;
        for i in start..start + width {
            out.push(if child.is_null(i) { f64::NAN } else { child.value(i) });
        }
    }
    Ok((width, out))
}

/// Extract raw category values from an id-list column.
///
/// Integers and booleans become [`CategoryValue::Int`], floats become
/// [`CategoryValue::Float`], and everything else is cast to a string.
/// Dictionary columns are classified by their value type.
pub fn category_values(array: &dyn Array) -> Result<Vec<Option<CategoryValue>>> {
    let kind = match array.data_type() {
        DataType::Dictionary(_, value) => value.as_ref(),
        other => other,
    };

    if kind.is_integer() || *kind == DataType::Boolean {
        let cast = cast(array, &DataType::Int64)?;
        Ok(cast
            .as_primitive::<Int64Type>()
            .iter()
            .map(|v| v.map(CategoryValue::Int))
            .collect())
    } else if kind.is_floating() {
        let cast = cast(array, &DataType::Float64)?;
        Ok(cast
            .as_primitive::<Float64Type>()
            .iter()
            .map(|v| v.map(|f| CategoryValue::Float(OrderedFloat(f))))
            .collect())
    } else {
        let cast = cast(array, &DataType::Utf8)?;
        Ok(cast
            .as_string::<i32>()
            .iter()
            .map(|v| v.map(|s| CategoryValue::Str(s.to_string())))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{
        ArrayRef, BooleanArray, DictionaryArray, FixedSizeListArray, Float32Array, Int32Array,
        LargeStringArray, StringArray,
    };
    use arrow::datatypes::{Float32Type, Int32Type};

    use super::*;

    #[test]
    fn test_numeric_values_casts_and_fills_nulls() {
        let array = Int32Array::from(vec![Some(1), None, Some(-3)]);
        let values = numeric_values("x", &array).expect("numeric");
        assert_eq!(values[0], 1.0);
        assert!(values[1].is_nan());
        assert_eq!(values[2], -3.0);
    }

    #[test]
    fn test_numeric_values_rejects_strings() {
        let array = StringArray::from(vec!["1.5"]);
        let err = numeric_values("price", &array).unwrap_err();
        assert!(matches!(err, PreprocError::UnsupportedType { ref column, .. } if column == "price"));
    }

    #[test]
    fn test_booleans_are_numeric() {
        let array = BooleanArray::from(vec![true, false]);
        assert_eq!(numeric_values("flag", &array).expect("numeric"), vec![1.0, 0.0]);
    }

    #[test]
    fn test_embedding_list_flattens_row_major() {
        let list = FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(
            vec![
                Some(vec![Some(1.0), Some(2.0)]),
                None,
                Some(vec![Some(5.0), None]),
            ],
            2,
        );
        let (width, values) = embedding_values("vec", &list).expect("embedding");
        assert_eq!(width, 2);
        assert_eq!(values.len(), 6);
        assert_eq!(&values[..2], &[1.0, 2.0]);
        assert!(values[2].is_nan() && values[3].is_nan());
        assert_eq!(values[4], 5.0);
        assert!(values[5].is_nan());
    }

    #[test]
    fn test_embedding_list_respects_slicing() {
        let list = FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(
            vec![
                Some(vec![Some(1.0), Some(2.0)]),
                Some(vec![Some(3.0), Some(4.0)]),
            ],
            2,
        );
        let sliced = list.slice(1, 1);
        let (_, values) = embedding_values("vec", &sliced).expect("embedding");
        assert_eq!(values, vec![3.0, 4.0]);
    }

    #[test]
    fn test_scalar_embedding_has_width_one() {
        let array = Float32Array::from(vec![0.5, 0.25]);
        let (width, values) = embedding_values("score", &array).expect("embedding");
        assert_eq!(width, 1);
        assert_eq!(values, vec![0.5, 0.25]);
    }

    #[test]
    fn test_embedding_width_from_type() {
        let list = FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(
            vec![Some(vec![Some(1.0), Some(2.0), Some(3.0)])],
            3,
        );
        assert_eq!(embedding_width("vec", list.data_type()).expect("list"), 3);
        assert_eq!(embedding_width("score", &DataType::Float32).expect("scalar"), 1);
        assert!(embedding_width("tag", &DataType::Utf8).is_err());
    }

    #[test]
    fn test_category_kinds() {
        let ints: ArrayRef = Arc::new(Int32Array::from(vec![Some(3), None]));
        assert_eq!(
            category_values(ints.as_ref()).expect("ints"),
            vec![Some(CategoryValue::Int(3)), None]
        );

        let strings = LargeStringArray::from(vec!["x"]);
        assert_eq!(
            category_values(&strings).expect("strings"),
            vec![Some(CategoryValue::Str("x".into()))]
        );

        let floats = Float32Array::from(vec![1.5]);
        assert_eq!(
            category_values(&floats).expect("floats"),
            vec![Some(CategoryValue::Float(OrderedFloat(1.5)))]
        );
    }

    #[test]
    fn test_dictionary_strings_are_unpacked() {
        let dict: DictionaryArray<Int32Type> = vec!["b", "a", "b"].into_iter().collect();
        assert_eq!(
            category_values(&dict).expect("dictionary"),
            vec![
                Some(CategoryValue::Str("b".into())),
                Some(CategoryValue::Str("a".into())),
                Some(CategoryValue::Str("b".into())),
            ]
        );
    }
}
