use glam::{DMat3, DVec3};

/// Utility function to convert a row-major 3x3 array to a glam matrix.
///
/// # Arguments
///
/// * `array` - A 3x3 array, indexed as `array[row][col]`.
///
/// # Returns
///
/// A glam matrix 3x3.
pub fn array33_to_dmat3(array: &[[f64; 3]; 3]) -> DMat3 {
    // glam stores columns, the arrays store rows
    DMat3::from_cols_array_2d(array).transpose()
}

/// Utility function to convert a glam matrix to a row-major 3x3 array.
pub fn dmat3_to_array33(mat: &DMat3) -> [[f64; 3]; 3] {
    mat.transpose().to_cols_array_2d()
}

/// Utility function to convert a 3D array to a glam vector.
pub fn array3_to_dvec3(array: &[f64; 3]) -> DVec3 {
    DVec3::from_array(*array)
}
