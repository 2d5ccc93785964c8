pub mod address;
pub mod buy_now_selection;
pub mod cart_item;
pub mod category;
pub mod order;
pub mod order_item;
pub mod product;
pub mod review;
pub mod user;

// Re-export entities
pub use address::{Entity as Address, Model as AddressModel};
pub use buy_now_selection::{Entity as BuyNowSelection, Model as BuyNowSelectionModel};
pub use cart_item::{Entity as CartItem, Model as CartItemModel};
pub use category::{Entity as Category, Model as CategoryModel};
pub use order::{Entity as Order, FulfillmentStatus, Model as OrderModel};
pub use order_item::{Entity as OrderItem, Model as OrderItemModel};
pub use product::{Entity as Product, Model as ProductModel};
pub use review::{Entity as Review, Model as ReviewModel};
pub use user::{Entity as User, Model as UserModel};
