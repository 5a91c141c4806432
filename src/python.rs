//! Python bindings.

use pyo3::prelude::*;
use pyo3::types::PyModule;
use pyo3::wrap_pyfunction;
use pyo3::PyClass;

use crate::error::Diagnostic;
use crate::package::{decode_file, Package};
use crate::scan::{self, FormPackageInfo, StringPackageInfo};
use crate::Diagnostics;

/// One decoded package, summarized.
#[pyclass(get_all)]
#[derive(Debug, Clone)]
pub struct PackageSummary {
    /// "Strings", "Forms" or the package type name.
    pub kind: String,
    /// Byte offset in the original blob.
    pub offset: usize,
    /// Length in bytes.
    pub length: usize,
    pub language: Option<String>,
    pub string_count: usize,
    pub opcode_count: usize,
}

impl From<&Package> for PackageSummary {
    fn from(package: &Package) -> Self {
        match package {
            Package::Strings(strings) => PackageSummary {
                kind: "Strings".into(),
                offset: strings.offset,
                length: strings.length,
                language: Some(strings.language.clone()),
                string_count: strings.entries.len(),
                opcode_count: 0,
            },
            Package::Forms(forms) => PackageSummary {
                kind: "Forms".into(),
                offset: forms.offset,
                length: forms.length,
                language: None,
                string_count: 0,
                opcode_count: forms.nodes().count(),
            },
            Package::Other {
                package_type,
                offset,
                raw_length,
            } => PackageSummary {
                kind: format!("{:?}", package_type),
                offset: *offset,
                length: *raw_length,
                language: None,
                string_count: 0,
                opcode_count: 0,
            },
        }
    }
}

#[pyclass(get_all)]
#[derive(Debug, Clone)]
pub struct DiagnosticInfo {
    pub severity: String,
    pub component: String,
    pub message: String,
    pub node_id: Option<u32>,
    pub offset: Option<usize>,
}

impl From<Diagnostic> for DiagnosticInfo {
    fn from(d: Diagnostic) -> Self {
        DiagnosticInfo {
            severity: format!("{:?}", d.severity),
            component: format!("{:?}", d.component),
            message: d.message,
            node_id: d.node_id,
            offset: d.offset,
        }
    }
}

fn into_py_objects<T: PyClass + Into<PyClassInitializer<T>>>(
    py: Python,
    items: Vec<T>,
) -> PyResult<Vec<Py<T>>> {
    items.into_iter().map(|item| Py::new(py, item)).collect()
}

/// Python binding for `decode_file`.
#[pyfunction]
#[pyo3(name = "decode_file")]
fn decode_file_py(
    py: Python,
    data: &[u8],
) -> PyResult<(Vec<Py<PackageSummary>>, Vec<Py<DiagnosticInfo>>)> {
    let (packages, diagnostics) = decode_file(data);
    let packages = packages.iter().map(PackageSummary::from).collect();
    let diagnostics = diagnostics.into_iter().map(DiagnosticInfo::from).collect();
    Ok((into_py_objects(py, packages)?, into_py_objects(py, diagnostics)?))
}

/// Python binding for `find_uefi_packages`.
#[pyfunction]
#[pyo3(name = "find_uefi_packages")]
fn find_uefi_packages_py(
    py: Python,
    data: &[u8],
) -> PyResult<(Vec<Py<StringPackageInfo>>, Vec<Py<FormPackageInfo>>)> {
    let (ss, fs) = scan::find_uefi_packages(data);
    Ok((into_py_objects(py, ss)?, into_py_objects(py, fs)?))
}

/// Python binding for `extract_uefi_ifr`.
#[pyfunction]
#[pyo3(name = "extract_uefi_ifr")]
fn extract_uefi_ifr_py(
    data: &[u8],
    form: PyRef<FormPackageInfo>,
    string: PyRef<StringPackageInfo>,
    verbose: bool,
) -> PyResult<String> {
    let mut diagnostics = Diagnostics::new();
    Ok(scan::extract_uefi_ifr(
        data,
        &form,
        &string,
        verbose,
        &mut diagnostics,
    ))
}

/// This module is a Python submodule implemented in Rust.
#[pymodule]
fn hii_ifr_decoder(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<PackageSummary>()?;
    m.add_class::<DiagnosticInfo>()?;
    m.add_class::<StringPackageInfo>()?;
    m.add_class::<FormPackageInfo>()?;
    m.add_function(wrap_pyfunction!(decode_file_py, m)?)?;
    m.add_function(wrap_pyfunction!(find_uefi_packages_py, m)?)?;
    m.add_function(wrap_pyfunction!(extract_uefi_ifr_py, m)?)?;
    Ok(())
}
