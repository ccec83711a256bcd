use crate::temporal::impl_temporal_aliases;
use crate::temporal::lifting::lift_unary;

impl_temporal_aliases!(Text, String);

impl TText {
    pub fn upper(&self) -> TText {
        lift_unary(self, &|v: &String| v.to_uppercase(), false, None)
    }

    pub fn lower(&self) -> TText {
        lift_unary(self, &|v: &String| v.to_lowercase(), false, None)
    }
}
