use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::bone::BoneNode;

/// Named hierarchy of bones plus the link to bone binding used to attach
/// geometry.
#[derive(Debug, Clone, Serialize)]
pub struct Rig {
    name: String,
    root: String,
    bones: Vec<BoneNode>,
    #[serde(skip)]
    index: HashMap<String, usize>,
    /// Link name to the name of the bone that moves it.
    link_bones: BTreeMap<String, String>,
}

impl Rig {
    pub fn new(name: impl Into<String>, root: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            bones: Vec::new(),
            index: HashMap::new(),
            link_bones: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the root bone.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Bone named `name`, created for `link` when missing. The flag tells
    /// whether it was created; an existing bone is returned untouched.
    pub fn get_or_create(&mut self, name: &str, link: &str) -> (&mut BoneNode, bool) {
        match self.index.get(name) {
            Some(&i) => (&mut self.bones[i], false),
            None => {
                let i = self.bones.len();
                self.index.insert(name.to_string(), i);
                self.bones.push(BoneNode::new(name, link));
                (&mut self.bones[i], true)
            }
        }
    }

    pub fn bone(&self, name: &str) -> Option<&BoneNode> {
        self.index.get(name).map(|&i| &self.bones[i])
    }

    pub fn bone_mut(&mut self, name: &str) -> Option<&mut BoneNode> {
        self.index.get(name).map(|&i| &mut self.bones[i])
    }

    /// Bones in creation order, root first.
    pub fn bones(&self) -> &[BoneNode] {
        &self.bones
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn bind_link(&mut self, link: &str, bone: &str) {
        self.link_bones.insert(link.to_string(), bone.to_string());
    }

    pub fn bone_for_link(&self, link: &str) -> Option<&BoneNode> {
        self.link_bones.get(link).and_then(|name| self.bone(name))
    }

    /// Bones carrying a limit constraint.
    pub fn posable_bones(&self) -> impl Iterator<Item = &BoneNode> {
        self.bones.iter().filter(|b| b.is_posable())
    }

    /// Names from `name` up to the root, inclusive. Stops after as many
    /// steps as there are bones, so a malformed hierarchy cannot loop.
    pub fn parent_chain(&self, name: &str) -> Vec<&str> {
        let mut chain = Vec::new();
        let mut current = self.bone(name);
        while let Some(bone) = current {
            if chain.len() == self.bones.len() {
                break;
            }
            chain.push(bone.name.as_str());
            current = bone.parent.as_deref().and_then(|p| self.bone(p));
        }
        chain
    }
}
