/*!
The fixed runtime library catalog.

These functions are pre-inserted into the outermost symbol-table scope so
user code can call them, and declared to the backend with the matching
lowered signatures.  They are linked from the precompiled runtime archive.
*/
use super::ast::{DataType, Dim, PassMode, ScalarKind};

pub struct RuntimeFn {
    pub name: &'static str,
    pub params: Vec<(&'static str, DataType, PassMode)>,
    pub ret: ScalarKind,
}

fn int() -> DataType {
    DataType::Scalar(ScalarKind::Int)
}

fn chr() -> DataType {
    DataType::Scalar(ScalarKind::Char)
}

/// `char[]`: an open character array, always by reference.
fn str_ty() -> DataType {
    DataType::Array {
        elem: ScalarKind::Char,
        dims: vec![Dim::Unspecified],
    }
}

pub fn catalog() -> Vec<RuntimeFn> {
    use PassMode::*;
    use ScalarKind::*;
    vec![
        RuntimeFn {
            name: "writeInteger",
            params: vec![("n", int(), ByValue)],
            ret: Nothing,
        },
        RuntimeFn {
            name: "writeChar",
            params: vec![("c", chr(), ByValue)],
            ret: Nothing,
        },
        RuntimeFn {
            name: "writeString",
            params: vec![("s", str_ty(), ByReference)],
            ret: Nothing,
        },
        RuntimeFn {
            name: "readInteger",
            params: vec![],
            ret: Int,
        },
        RuntimeFn {
            name: "readChar",
            params: vec![],
            ret: Char,
        },
        RuntimeFn {
            name: "readString",
            params: vec![("n", int(), ByValue), ("s", str_ty(), ByReference)],
            ret: Nothing,
        },
        RuntimeFn {
            name: "ascii",
            params: vec![("c", chr(), ByValue)],
            ret: Int,
        },
        RuntimeFn {
            name: "chr",
            params: vec![("n", int(), ByValue)],
            ret: Char,
        },
        RuntimeFn {
            name: "strlen",
            params: vec![("s", str_ty(), ByReference)],
            ret: Int,
        },
        RuntimeFn {
            name: "strcmp",
            params: vec![("s1", str_ty(), ByReference), ("s2", str_ty(), ByReference)],
            ret: Int,
        },
        RuntimeFn {
            name: "strcpy",
            params: vec![("trg", str_ty(), ByReference), ("src", str_ty(), ByReference)],
            ret: Nothing,
        },
        RuntimeFn {
            name: "strcat",
            params: vec![("trg", str_ty(), ByReference), ("src", str_ty(), ByReference)],
            ret: Nothing,
        },
    ]
}
