use std::collections::BTreeMap;

use crate::consolidate::{ConsolidatedTarget, ConsolidatedTargetKey, ConsolidatedTargets};
use crate::dto::{FilePath, ProductType, Target, TargetID};
use crate::error::{PreconditionError, precondition};
use crate::pbx::{Element, FileReference, ObjectId, ProductReference, SourceTree};
use crate::platform::Precedence;
use crate::sort::sorted_by_target_key;

pub const PRODUCTS_GROUP_NAME: &str = "Products";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Products {
  pub by_target:    BTreeMap<ConsolidatedTargetKey, ProductReference>,
  /// Every member output path, not only the canonical one.
  pub by_file_path: BTreeMap<FilePath, ProductReference>
}

impl Products {
  pub fn for_target(&self, key: &ConsolidatedTargetKey) -> Result<&ProductReference, PreconditionError> {
    match self.by_target.get(key) {
      Some(p) => Ok(p),
      None    => precondition(format!("Product for target \"{}\" not found in `products`", key))
    }
  }
}

/// The member whose product the project shows. Highest platform precedence
/// wins, then the lexicographically last product path.
pub fn canonical_member<'a>(target: &'a ConsolidatedTarget, precedence: &Precedence) -> (&'a TargetID, &'a Target) {
  let best = target.targets.iter()
    .max_by(|(_, a), (_, b)| precedence.rank(a.platform.class()).cmp(&precedence.rank(b.platform.class()))
                               .then_with(|| a.product.path.cmp(&b.product.path)));
  match best {
    Some(m) => m,
    None    => unreachable!("consolidated targets have at least one member")
  }
}

pub fn canonical<'a>(target: &'a ConsolidatedTarget, precedence: &Precedence) -> &'a Target {
  canonical_member(target, precedence).1
}

fn product_element(key: &ConsolidatedTargetKey, target: &Target) -> Element {
  let path = &target.product.path;
  let id   = ObjectId::new("PBXFileReference", &["product:", &key.to_string()].concat());
  let (name, path) = match target.product.product_type {
    ProductType::StaticLibrary => (Some(path.file_name().to_string()), ["bazel-out/", &path.path].concat()),
    _                          => (None, path.file_name().to_string())
  };
  Element::file(id, name, Some(path), SourceTree::BuiltProductsDir,
                FileReference::explicit(target.product.product_type.file_type()))
}

/// One product reference per consolidated target, and the group showing them.
pub fn create_products(consolidated: &ConsolidatedTargets, precedence: &Precedence) -> (Products, Element) {
  let mut products = Products::default();
  let mut elements = BTreeMap::new();

  for (key, target) in &consolidated.targets {
    let member    = canonical(target, precedence);
    let element   = product_element(key, member);
    let reference = ProductReference {
      id:   element.id.clone(),
      name: member.product.path.file_name().to_string()
    };
    for path in target.product_paths() {
      products.by_file_path.insert(path.clone(), reference.clone());
    }
    products.by_target.insert(key.clone(), reference);
    elements.insert(key, element);
  }

  let children = sorted_by_target_key(elements.iter().map(|(k, e)| (*k, e))).into_iter().cloned().collect();
  let group    = Element::group(ObjectId::new("PBXGroup", PRODUCTS_GROUP_NAME), Some(PRODUCTS_GROUP_NAME.to_string()),
                                None, SourceTree::Group, children);
  (products, group)
}
