//! Benchmarks for the in-memory store's checkout commit path.

use common::{ProductId, UserId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{Cart, Money, Order, OrderedItem, Product};
use store::{CheckoutPlan, FulfillmentStore, InMemoryStore, StockDecrement};

fn bench_commit_checkout(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("commit_checkout_memory", |b| {
        b.to_async(&runtime).iter(|| async {
            let store = InMemoryStore::new();
            let product =
                Product::new(ProductId::new(), "Widget", Money::from_cents(1000), 1000);
            store.upsert_product(&product).await.unwrap();

            let mut cart = Cart::for_user(UserId::new());
            cart.add_item(product.id, 2).unwrap();
            store.save_cart(&cart).await.unwrap();

            let items = vec![OrderedItem::snapshot(&product, 2)];
            let decrements = vec![StockDecrement {
                product_id: product.id,
                quantity: 2,
            }];
            let order = Order::place(cart.owner.unwrap(), items, "1 Main St").unwrap();
            let plan = CheckoutPlan {
                order,
                decrements,
                cart_id: cart.id,
            };

            store.commit_checkout(plan).await.unwrap()
        });
    });
}

criterion_group!(benches, bench_commit_checkout);
criterion_main!(benches);
