mod dataclass_tests;
mod order_law_tests;
mod protocol_tests;
mod subtype_tests;
mod weaken_tests;
