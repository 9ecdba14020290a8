use fxhash::FxHashSet;
use serde::{Deserialize, Serialize};

/// An opaque capability tag. A vehicle can serve a job only when it carries
/// every skill the job requires.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Skill(String);

impl Skill {
    pub fn new(skill: impl Into<String>) -> Self {
        Skill(skill.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub type SkillSet = FxHashSet<Skill>;

pub fn skill_set(skills: impl IntoIterator<Item = impl Into<String>>) -> SkillSet {
    skills.into_iter().map(Skill::new).collect()
}
