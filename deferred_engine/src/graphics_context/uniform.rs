/// Uniform values as uploaded to a program
///
/// Matrices carry their element order explicitly. `ShaderProgram` always
/// uploads rows with `row_major: true`; the backend forwards the flag as the
/// transpose argument of the matrix upload.

use glam::{Mat2, Mat3, Mat4, Vec2, Vec3, Vec4};

/// A single uniform upload
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// Integer (also used for booleans and sampler units)
    Int(i32),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat2 { values: [f32; 4], row_major: bool },
    Mat3 { values: [f32; 9], row_major: bool },
    Mat4 { values: [f32; 16], row_major: bool },
}

impl UniformValue {
    /// Rebuild a glam matrix from a 4x4 upload, honouring the element order
    pub fn as_mat4(&self) -> Option<Mat4> {
        match *self {
            UniformValue::Mat4 { values, row_major: true } => {
                Some(Mat4::from_cols_array(&values).transpose())
            }
            UniformValue::Mat4 { values, row_major: false } => Some(Mat4::from_cols_array(&values)),
            _ => None,
        }
    }

    pub fn as_mat3(&self) -> Option<Mat3> {
        match *self {
            UniformValue::Mat3 { values, row_major: true } => {
                Some(Mat3::from_cols_array(&values).transpose())
            }
            UniformValue::Mat3 { values, row_major: false } => Some(Mat3::from_cols_array(&values)),
            _ => None,
        }
    }

    pub fn as_mat2(&self) -> Option<Mat2> {
        match *self {
            UniformValue::Mat2 { values, row_major: true } => {
                Some(Mat2::from_cols_array(&values).transpose())
            }
            UniformValue::Mat2 { values, row_major: false } => Some(Mat2::from_cols_array(&values)),
            _ => None,
        }
    }

    pub fn as_vec3(&self) -> Option<Vec3> {
        match *self {
            UniformValue::Vec3(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_vec4(&self) -> Option<Vec4> {
        match *self {
            UniformValue::Vec4(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match *self {
            UniformValue::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match *self {
            UniformValue::Int(v) => Some(v),
            _ => None,
        }
    }
}

/// Types accepted by `ShaderProgram::set_uniform`
pub trait UniformData {
    fn to_uniform_value(&self) -> UniformValue;
}

impl UniformData for bool {
    fn to_uniform_value(&self) -> UniformValue {
        UniformValue::Int(*self as i32)
    }
}

impl UniformData for i32 {
    fn to_uniform_value(&self) -> UniformValue {
        UniformValue::Int(*self)
    }
}

impl UniformData for f32 {
    fn to_uniform_value(&self) -> UniformValue {
        UniformValue::Float(*self)
    }
}

impl UniformData for Vec2 {
    fn to_uniform_value(&self) -> UniformValue {
        UniformValue::Vec2(*self)
    }
}

impl UniformData for Vec3 {
    fn to_uniform_value(&self) -> UniformValue {
        UniformValue::Vec3(*self)
    }
}

impl UniformData for Vec4 {
    fn to_uniform_value(&self) -> UniformValue {
        UniformValue::Vec4(*self)
    }
}

// glam stores columns; the transpose's column array is the row-major element order.

impl UniformData for Mat2 {
    fn to_uniform_value(&self) -> UniformValue {
        UniformValue::Mat2 { values: self.transpose().to_cols_array(), row_major: true }
    }
}

impl UniformData for Mat3 {
    fn to_uniform_value(&self) -> UniformValue {
        UniformValue::Mat3 { values: self.transpose().to_cols_array(), row_major: true }
    }
}

impl UniformData for Mat4 {
    fn to_uniform_value(&self) -> UniformValue {
        UniformValue::Mat4 { values: self.transpose().to_cols_array(), row_major: true }
    }
}
