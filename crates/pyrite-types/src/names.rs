//! Well-known interned names.
//!
//! Primitive class names the solver special-cases are interned once at first
//! use. All lookups go through `well_known()` so tests and workers agree on
//! the same atoms.

use once_cell::sync::Lazy;
use pyrite_common::{intern, Atom};

pub struct WellKnownNames {
    pub object: Atom,
    pub r#type: Atom,
    pub bool_: Atom,
    pub int: Atom,
    pub float: Atom,
    pub complex: Atom,
    pub str_: Atom,
    pub bytes: Atom,
    pub none_type: Atom,
    pub tuple: Atom,
    pub list: Atom,
    pub set: Atom,
    pub dict: Atom,
    pub slice: Atom,
    pub ellipsis: Atom,
    pub base_exception: Atom,
    pub generic: Atom,
    pub protocol: Atom,
    pub generic_meta: Atom,
    pub mapping: Atom,
    pub mutable_mapping: Atom,
    pub sequence: Atom,
    pub iterable: Atom,
    pub iterator: Atom,
    pub abstract_set: Atom,
    pub awaitable: Atom,
    pub coroutine: Atom,
    pub optional: Atom,
    pub union: Atom,
    pub callable: Atom,
    pub literal: Atom,
    pub annotated: Atom,
    pub type_alias: Atom,
    pub typed_dictionary: Atom,
    pub non_total_typed_dictionary: Atom,
    pub init_var: Atom,
    pub class_var: Atom,
    pub final_: Atom,
    pub any: Atom,
    /// Synthetic marker for names that resolve nowhere; absorbs into unions.
    pub undeclared: Atom,
    // Dunder members the resolver synthesizes or special-cases.
    pub call_attribute: Atom,
    pub init: Atom,
    pub new: Atom,
    pub getattr: Atom,
    pub getitem: Atom,
    pub setitem: Atom,
    pub delitem: Atom,
    pub get: Atom,
    pub setdefault: Atom,
    pub update: Atom,
    pub pop: Atom,
    pub repr: Atom,
    pub eq: Atom,
    pub lt: Atom,
    pub le: Atom,
    pub gt: Atom,
    pub ge: Atom,
    pub self_parameter: Atom,
}

static WELL_KNOWN: Lazy<WellKnownNames> = Lazy::new(|| WellKnownNames {
    object: intern("object"),
    r#type: intern("type"),
    bool_: intern("bool"),
    int: intern("int"),
    float: intern("float"),
    complex: intern("complex"),
    str_: intern("str"),
    bytes: intern("bytes"),
    none_type: intern("NoneType"),
    tuple: intern("tuple"),
    list: intern("list"),
    set: intern("set"),
    dict: intern("dict"),
    slice: intern("slice"),
    ellipsis: intern("ellipsis"),
    base_exception: intern("BaseException"),
    generic: intern("typing.Generic"),
    protocol: intern("typing.Protocol"),
    generic_meta: intern("typing.GenericMeta"),
    mapping: intern("typing.Mapping"),
    mutable_mapping: intern("typing.MutableMapping"),
    sequence: intern("typing.Sequence"),
    iterable: intern("typing.Iterable"),
    iterator: intern("typing.Iterator"),
    abstract_set: intern("typing.AbstractSet"),
    awaitable: intern("typing.Awaitable"),
    coroutine: intern("typing.Coroutine"),
    optional: intern("typing.Optional"),
    union: intern("typing.Union"),
    callable: intern("typing.Callable"),
    literal: intern("typing_extensions.Literal"),
    annotated: intern("typing.Annotated"),
    type_alias: intern("typing_extensions.TypeAlias"),
    typed_dictionary: intern("TypedDictionary"),
    non_total_typed_dictionary: intern("NonTotalTypedDictionary"),
    init_var: intern("dataclasses.InitVar"),
    class_var: intern("typing.ClassVar"),
    final_: intern("typing.Final"),
    any: intern("typing.Any"),
    undeclared: intern("typing.Undeclared"),
    call_attribute: intern("__call__"),
    init: intern("__init__"),
    new: intern("__new__"),
    getattr: intern("__getattr__"),
    getitem: intern("__getitem__"),
    setitem: intern("__setitem__"),
    delitem: intern("__delitem__"),
    get: intern("get"),
    setdefault: intern("setdefault"),
    update: intern("update"),
    pop: intern("pop"),
    repr: intern("__repr__"),
    eq: intern("__eq__"),
    lt: intern("__lt__"),
    le: intern("__le__"),
    gt: intern("__gt__"),
    ge: intern("__ge__"),
    self_parameter: intern("self"),
});

pub fn well_known() -> &'static WellKnownNames {
    &WELL_KNOWN
}
