use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{info, warn};
use pawmart_cart::{
    Cart, CartError, CartLine, CartTotals, PromoContext, PromoEngine, PromoRule, TotalsCalculator,
    TotalsConfig, Wishlist, WishlistEntry,
};
use pawmart_catalog::{Catalog, InventoryManager, ListingKind, ProductError};
use pawmart_core::chat::{ChatBot, ChatMessage, ChatReply, ChatSession};
use pawmart_core::identity::{AuthError, AuthService, NewProfile, OtpChallenge, OtpConfig, Role, SignIn, User};
use pawmart_core::payment::{PaymentMethod, PaymentReceipt};
use pawmart_order::{CheckoutError, Order, OrderLine, OrderManager, OrderStatus, ShippingAddress, StatusChange};
use pawmart_shared::StoreEvent;

use crate::app_config::Config;
use crate::error::StoreError;
use crate::events::EventBus;

pub const GUEST_PREFIX: &str = "guest-";
const SNAPSHOT_VERSION: u32 = 1;

pub fn guest_shopper_id() -> String {
    format!("{}{}", GUEST_PREFIX, Uuid::new_v4())
}

/// Registered user behind a shopper id; guests have none
pub fn user_id_of(shopper_id: &str) -> Option<Uuid> {
    if shopper_id.starts_with(GUEST_PREFIX) {
        return None;
    }
    Uuid::parse_str(shopper_id).ok()
}

/// Everything kept per browsing session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopperState {
    pub cart: Cart,
    pub wishlist: Wishlist,
    pub chat: ChatSession,
    #[serde(default = "Utc::now")]
    pub last_active: DateTime<Utc>,
}

impl Default for ShopperState {
    fn default() -> Self {
        Self {
            cart: Cart::default(),
            wishlist: Wishlist::default(),
            chat: ChatSession::default(),
            last_active: Utc::now(),
        }
    }
}

impl ShopperState {
    /// Nothing worth keeping
    pub fn is_empty(&self) -> bool {
        self.cart.is_empty() && self.wishlist.is_empty() && self.chat.messages.is_empty()
    }

    fn touch(&mut self) -> &mut Self {
        self.last_active = Utc::now();
        self
    }
}

/// Session for `shopper_id`, created on first use and marked active
fn shopper_entry<'a>(shoppers: &'a mut HashMap<String, ShopperState>, shopper_id: &str) -> &'a mut ShopperState {
    shoppers.entry(shopper_id.to_string()).or_default().touch()
}

/// Cart plus its derived totals
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub cart: Cart,
    pub totals: CartTotals,
}

#[derive(Debug, Clone)]
pub struct StorefrontSettings {
    pub totals: TotalsConfig,
    pub otp: OtpConfig,
    pub max_line_quantity: u32,
    /// Guest sessions untouched for this long are dropped by `prune_guest_sessions`
    pub guest_idle_minutes: i64,
}

impl Default for StorefrontSettings {
    fn default() -> Self {
        Self {
            totals: TotalsConfig::default(),
            otp: OtpConfig::default(),
            max_line_quantity: 10,
            guest_idle_minutes: 24 * 60,
        }
    }
}

impl From<&Config> for StorefrontSettings {
    fn from(config: &Config) -> Self {
        Self {
            totals: config.business_rules.totals(),
            otp: config.otp.clone(),
            max_line_quantity: config.business_rules.max_line_quantity,
            guest_idle_minutes: config.sessions.guest_idle_minutes,
        }
    }
}

/// Serializable copy of all mutable store state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub users: Vec<User>,
    pub orders: OrderManager,
    pub inventory: InventoryManager,
    pub shoppers: HashMap<String, ShopperState>,
}

/// The storefront state container.
///
/// Shoppers are addressed by id: `guest-<uuid>` for anonymous sessions,
/// the user id for signed-in customers.
pub struct Storefront {
    catalog: Catalog,
    inventory: InventoryManager,
    promos: PromoEngine,
    totals: TotalsCalculator,
    auth: AuthService,
    orders: OrderManager,
    chat_bot: ChatBot,
    shoppers: HashMap<String, ShopperState>,
    events: EventBus,
    max_line_quantity: u32,
    guest_idle: chrono::Duration,
}

impl Storefront {
    pub fn new(catalog: Catalog, settings: StorefrontSettings) -> Self {
        let mut inventory = InventoryManager::new();
        for product in &catalog.products {
            inventory.initialize(product.id, product.stock);
        }
        for pet in &catalog.pets {
            inventory.initialize(pet.id, u32::from(pet.is_available));
        }

        Self {
            catalog,
            inventory,
            promos: PromoEngine::default(),
            totals: TotalsCalculator::new(settings.totals),
            auth: AuthService::with_demo_accounts(settings.otp),
            orders: OrderManager::new(),
            chat_bot: ChatBot::default(),
            shoppers: HashMap::new(),
            events: EventBus::default(),
            max_line_quantity: settings.max_line_quantity,
            guest_idle: chrono::Duration::minutes(settings.guest_idle_minutes),
        }
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn inventory(&self) -> &InventoryManager {
        &self.inventory
    }

    pub fn promos(&self) -> &PromoEngine {
        &self.promos
    }

    pub fn user(&self, user_id: &Uuid) -> Option<&User> {
        self.auth.user(user_id)
    }

    pub fn user_by_phone(&self, phone: &str) -> Option<&User> {
        self.auth.user_by_phone(phone)
    }

    // ---- cart ----

    pub fn cart(&self, shopper_id: &str) -> CartView {
        let cart = self.shoppers
            .get(shopper_id)
            .map(|s| s.cart.clone())
            .unwrap_or_default();
        let totals = self.totals.compute(&cart, self.active_promo(shopper_id, &cart));
        CartView { cart, totals }
    }

    pub fn add_to_cart(&mut self, shopper_id: &str, listing_id: &Uuid, quantity: u32) -> Result<CartView, StoreError> {
        let listing = self.catalog.find_listing(listing_id)
            .ok_or(StoreError::ListingNotFound(*listing_id))?;
        let state = shopper_entry(&mut self.shoppers, shopper_id);
        state.cart.add(listing, quantity, self.max_line_quantity)?;
        Ok(self.after_cart_change(shopper_id))
    }

    /// Set a line's quantity; zero removes it
    pub fn update_cart_item(&mut self, shopper_id: &str, listing_id: &Uuid, quantity: u32) -> Result<CartView, StoreError> {
        let listing = self.catalog.find_listing(listing_id)
            .ok_or(StoreError::ListingNotFound(*listing_id))?;
        let state = self.shoppers.get_mut(shopper_id)
            .ok_or(CartError::LineNotFound(*listing_id))?
            .touch();
        state.cart.update_quantity(listing, quantity, self.max_line_quantity)?;
        Ok(self.after_cart_change(shopper_id))
    }

    pub fn remove_cart_item(&mut self, shopper_id: &str, listing_id: &Uuid) -> Result<CartView, StoreError> {
        let state = self.shoppers.get_mut(shopper_id)
            .ok_or(CartError::LineNotFound(*listing_id))?
            .touch();
        state.cart.remove(listing_id)?;
        Ok(self.after_cart_change(shopper_id))
    }

    pub fn clear_cart(&mut self, shopper_id: &str) -> CartView {
        if let Some(state) = self.shoppers.get_mut(shopper_id) {
            state.cart.clear();
        }
        self.after_cart_change(shopper_id)
    }

    pub fn apply_promo(&mut self, shopper_id: &str, code: &str) -> Result<CartView, StoreError> {
        let first_order = self.is_first_order(shopper_id);
        let state = shopper_entry(&mut self.shoppers, shopper_id);
        let context = PromoContext::from_cart(&state.cart, first_order);
        let rule = self.promos.validate(code, &context)?;

        info!("Promo {} applied for {}", rule.code, shopper_id);
        state.cart.promo_code = Some(rule.code.clone());
        Ok(self.cart(shopper_id))
    }

    pub fn remove_promo(&mut self, shopper_id: &str) -> CartView {
        if let Some(state) = self.shoppers.get_mut(shopper_id) {
            state.cart.promo_code = None;
        }
        self.cart(shopper_id)
    }

    fn active_promo(&self, shopper_id: &str, cart: &Cart) -> Option<&PromoRule> {
        let code = cart.promo_code.as_deref()?;
        let context = PromoContext::from_cart(cart, self.is_first_order(shopper_id));
        self.promos.validate(code, &context).ok()
    }

    fn is_first_order(&self, shopper_id: &str) -> bool {
        user_id_of(shopper_id).map_or(true, |id| self.auth.is_first_order(&id))
    }

    /// Drop a promo whose conditions stopped holding
    fn revalidate_promo(&mut self, shopper_id: &str) {
        let first_order = self.is_first_order(shopper_id);
        let Some(state) = self.shoppers.get_mut(shopper_id) else {
            return;
        };
        let Some(code) = state.cart.promo_code.clone() else {
            return;
        };

        let context = PromoContext::from_cart(&state.cart, first_order);
        if let Err(e) = self.promos.validate(&code, &context) {
            info!("Dropping promo {} for {}: {}", code, shopper_id, e);
            state.cart.promo_code = None;
        }
    }

    fn after_cart_change(&mut self, shopper_id: &str) -> CartView {
        self.revalidate_promo(shopper_id);
        let view = self.cart(shopper_id);
        self.events.publish(StoreEvent::CartUpdated {
            shopper_id: shopper_id.to_string(),
            item_count: view.cart.item_count(),
            subtotal_cents: view.totals.subtotal_cents,
            timestamp: Utc::now().timestamp(),
        });
        view
    }

    // ---- wishlist ----

    pub fn wishlist(&self, shopper_id: &str) -> Wishlist {
        self.shoppers
            .get(shopper_id)
            .map(|s| s.wishlist.clone())
            .unwrap_or_default()
    }

    /// Returns false when the listing was already saved
    pub fn add_to_wishlist(&mut self, shopper_id: &str, listing_id: &Uuid) -> Result<bool, StoreError> {
        let listing = self.catalog.find_listing(listing_id)
            .ok_or(StoreError::ListingNotFound(*listing_id))?;
        let state = shopper_entry(&mut self.shoppers, shopper_id);
        Ok(state.wishlist.add(listing))
    }

    /// Returns whether the listing is saved afterwards
    pub fn toggle_wishlist(&mut self, shopper_id: &str, listing_id: &Uuid) -> Result<bool, StoreError> {
        let listing = self.catalog.find_listing(listing_id)
            .ok_or(StoreError::ListingNotFound(*listing_id))?;
        let state = shopper_entry(&mut self.shoppers, shopper_id);
        Ok(state.wishlist.toggle(listing))
    }

    pub fn remove_from_wishlist(&mut self, shopper_id: &str, listing_id: &Uuid) -> Result<WishlistEntry, StoreError> {
        self.shoppers
            .get_mut(shopper_id)
            .and_then(|s| s.touch().wishlist.remove(listing_id))
            .ok_or(StoreError::NotInWishlist(*listing_id))
    }

    pub fn move_to_cart(&mut self, shopper_id: &str, listing_id: &Uuid) -> Result<CartView, StoreError> {
        let listing = self.catalog.find_listing(listing_id)
            .ok_or(StoreError::ListingNotFound(*listing_id))?;
        let state = self.shoppers.get_mut(shopper_id)
            .filter(|s| s.wishlist.contains(listing_id))
            .ok_or(StoreError::NotInWishlist(*listing_id))?
            .touch();

        state.wishlist.move_to_cart(listing, &mut state.cart, self.max_line_quantity)?;
        Ok(self.after_cart_change(shopper_id))
    }

    // ---- identity ----

    pub fn request_otp(&mut self, phone: &str) -> Result<OtpChallenge, StoreError> {
        Ok(self.auth.request_otp(phone)?)
    }

    /// Verify a code and carry the shopper's guest session over to the account
    pub fn verify_otp(
        &mut self,
        shopper_id: &str,
        phone: &str,
        code: &str,
        profile: Option<NewProfile>,
    ) -> Result<SignIn, StoreError> {
        let sign_in = self.auth.verify_otp(phone, code, profile)?;
        self.login(shopper_id, &sign_in.user.id);

        self.events.publish(StoreEvent::UserSignedIn {
            user_id: sign_in.user.id,
            is_new: sign_in.is_new,
            timestamp: Utc::now().timestamp(),
        });
        Ok(sign_in)
    }

    /// Merge a guest's cart and wishlist into the user's own.
    ///
    /// Only `guest-` sessions are merged; another account's session is left alone.
    pub fn login(&mut self, shopper_id: &str, user_id: &Uuid) {
        let user_key = user_id.to_string();
        if !shopper_id.starts_with(GUEST_PREFIX) {
            return;
        }
        let Some(guest) = self.shoppers.remove(shopper_id) else {
            return;
        };

        let max_line_quantity = self.max_line_quantity;
        let state = shopper_entry(&mut self.shoppers, &user_key);
        state.cart.merge(guest.cart, &self.catalog, max_line_quantity);
        state.wishlist.merge(guest.wishlist);
        state.chat.append(guest.chat.messages);

        info!("Merged guest session {} into user {}", shopper_id, user_key);
        self.revalidate_promo(&user_key);
    }

    pub fn switch_role(&mut self, user_id: &Uuid, role: Role) -> Result<User, StoreError> {
        Ok(self.auth.switch_role(user_id, role)?.clone())
    }

    pub fn purge_expired_otps(&mut self) -> usize {
        self.auth.purge_expired()
    }

    /// Drop guest sessions that hold nothing or have sat idle too long;
    /// returns how many went
    pub fn prune_guest_sessions(&mut self) -> usize {
        let cutoff = Utc::now() - self.guest_idle;
        let before = self.shoppers.len();
        self.shoppers.retain(|id, state| {
            !id.starts_with(GUEST_PREFIX) || (!state.is_empty() && state.last_active > cutoff)
        });
        before - self.shoppers.len()
    }

    pub fn shopper_count(&self) -> usize {
        self.shoppers.len()
    }

    // ---- checkout ----

    /// Reserve stock and place a pending order from the shopper's cart.
    ///
    /// The order stays pending until `complete_checkout` records the
    /// payment outcome.
    pub fn begin_checkout(
        &mut self,
        shopper_id: &str,
        address: &ShippingAddress,
        payment_method: PaymentMethod,
    ) -> Result<Order, StoreError> {
        let user_id = user_id_of(shopper_id).ok_or(StoreError::AuthenticationRequired)?;
        if self.auth.user(&user_id).is_none() {
            return Err(AuthError::UserNotFound(user_id).into());
        }
        let address = address.validate()?;

        self.revalidate_promo(shopper_id);
        let view = self.cart(shopper_id);
        if view.cart.is_empty() {
            return Err(CartError::Empty.into());
        }
        for line in &view.cart.lines {
            let listing = self.catalog.find_listing(&line.listing_id)
                .ok_or(StoreError::ListingNotFound(line.listing_id))?;
            if !listing.is_available() {
                return Err(CartError::Unavailable(line.name.clone()).into());
            }
        }

        self.reserve_lines(&view.cart.lines)?;

        let lines: Vec<OrderLine> = view.cart.lines.iter().map(OrderLine::from).collect();
        let order = match self.orders.place_order(user_id.to_string(), lines, address, payment_method, view.totals) {
            Ok(order) => order,
            Err(e) => {
                self.release_lines(view.cart.lines.iter().map(|l| (l.listing_id, l.quantity)));
                return Err(e.into());
            }
        };
        self.auth.record_order(&user_id)?;

        if let Some(state) = self.shoppers.get_mut(shopper_id) {
            state.cart.clear();
        }

        self.events.publish(StoreEvent::OrderPlaced {
            order_id: order.id,
            order_number: order.order_number.clone(),
            customer_id: order.customer_id.clone(),
            total_cents: order.totals.total_cents,
            timestamp: Utc::now().timestamp(),
        });
        self.after_cart_change(shopper_id);

        Ok(order)
    }

    /// Confirm a pending order on approval; cancel it and free its stock otherwise
    pub fn complete_checkout(
        &mut self,
        order_id: &Uuid,
        outcome: Result<PaymentReceipt, CheckoutError>,
    ) -> Result<Order, StoreError> {
        let change = match outcome {
            Ok(receipt) => self.orders.confirm(order_id, Some(receipt.reference))?,
            Err(e) => {
                warn!("Checkout failed for order {}: {}", order_id, e);
                self.orders.cancel(order_id, Some(e.to_string()))?
            }
        };
        self.order_changed(order_id, change)
    }

    fn reserve_lines(&mut self, lines: &[CartLine]) -> Result<(), StoreError> {
        let mut reserved = Vec::with_capacity(lines.len());
        for line in lines {
            if let Err(e) = self.inventory.reserve(&line.listing_id, line.quantity) {
                self.release_lines(reserved);
                return Err(e.into());
            }
            reserved.push((line.listing_id, line.quantity));
        }
        for line in lines {
            self.sync_listing(&line.listing_id);
        }
        Ok(())
    }

    fn release_lines(&mut self, lines: impl IntoIterator<Item = (Uuid, u32)>) {
        for (listing_id, quantity) in lines {
            if let Err(e) = self.inventory.release(&listing_id, quantity) {
                warn!("Failed to release {} x{}: {}", listing_id, quantity, e);
            }
            self.sync_listing(&listing_id);
        }
    }

    fn commit_lines(&mut self, lines: impl IntoIterator<Item = (Uuid, u32)>) {
        for (listing_id, quantity) in lines {
            if let Err(e) = self.inventory.commit(&listing_id, quantity) {
                warn!("Failed to commit {} x{}: {}", listing_id, quantity, e);
            }
        }
    }

    /// Mirror inventory onto the catalog record shoppers see
    fn sync_listing(&mut self, listing_id: &Uuid) {
        let available = self.inventory.available(listing_id);
        let kind = self.catalog.find_listing(listing_id).map(|l| l.kind());
        let synced = match kind {
            Some(ListingKind::Product) => self.catalog.set_stock(listing_id, available),
            Some(ListingKind::Pet) => self.catalog.set_pet_available(listing_id, available > 0),
            None => Err(ProductError::NotFound(*listing_id)),
        };
        if let Err(e) = synced {
            warn!("Stock sync skipped: {}", e);
        }
    }

    // ---- orders ----

    pub fn order(&self, order_id: &Uuid) -> Option<&Order> {
        self.orders.get_order(order_id)
    }

    pub fn order_for(&self, customer_id: &str, order_id: &Uuid) -> Result<Order, StoreError> {
        Ok(self.orders.order_for(customer_id, order_id)?.clone())
    }

    pub fn orders_for(&self, customer_id: &str) -> Vec<Order> {
        self.orders.orders_for(customer_id).into_iter().cloned().collect()
    }

    pub fn all_orders(&self) -> Vec<Order> {
        self.orders.all_orders().into_iter().cloned().collect()
    }

    pub fn cancel_order(&mut self, customer_id: &str, order_id: &Uuid, reason: Option<String>) -> Result<Order, StoreError> {
        let change = self.orders.cancel_for(customer_id, order_id, reason)?;
        self.order_changed(order_id, change)
    }

    /// Move a paid order one step along confirmed → processing → shipped → delivered.
    ///
    /// Pending orders only leave pending through `complete_checkout`.
    pub fn advance_order(&mut self, order_id: &Uuid) -> Result<Order, StoreError> {
        let status = self.orders.get_order(order_id)
            .map(|o| o.status)
            .ok_or(pawmart_order::OrderError::NotFound(*order_id))?;
        if status == OrderStatus::Pending {
            return Err(pawmart_order::OrderError::InvalidTransition {
                from: OrderStatus::Pending,
                to: OrderStatus::Confirmed,
            }.into());
        }
        let change = self.orders.advance(order_id)?;
        self.order_changed(order_id, change)
    }

    /// Advance every paid, undelivered order one step; pending orders wait for payment
    pub fn auto_advance(&mut self) -> Vec<Order> {
        let ids: Vec<Uuid> = self.orders.open_order_ids()
            .into_iter()
            .filter(|id| {
                self.orders.get_order(id)
                    .is_some_and(|o| o.status != OrderStatus::Pending)
            })
            .collect();

        ids.iter()
            .filter_map(|id| match self.advance_order(id) {
                Ok(order) => Some(order),
                Err(e) => {
                    warn!("Auto-advance failed for {}: {}", id, e);
                    None
                }
            })
            .collect()
    }

    /// Apply stock side effects of a transition and announce it
    fn order_changed(&mut self, order_id: &Uuid, change: StatusChange) -> Result<Order, StoreError> {
        let order = self.orders.get_order(order_id)
            .cloned()
            .ok_or(pawmart_order::OrderError::NotFound(*order_id))?;
        let lines = order.lines.iter().map(|l| (l.listing_id, l.quantity)).collect::<Vec<_>>();

        match change.to {
            OrderStatus::Shipped => self.commit_lines(lines),
            OrderStatus::Cancelled => self.release_lines(lines),
            _ => {}
        }

        self.events.publish(StoreEvent::OrderStatusChanged {
            order_id: order.id,
            customer_id: order.customer_id.clone(),
            from: change.from.map(|s| s.to_string()).unwrap_or_default(),
            to: change.to.to_string(),
            timestamp: change.at.timestamp(),
        });
        Ok(order)
    }

    // ---- seller ----

    /// Overwrite a product's available stock; returns the new level
    pub fn set_stock(&mut self, product_id: &Uuid, quantity: u32) -> Result<u32, StoreError> {
        self.catalog.product(product_id).ok_or(ProductError::NotFound(*product_id))?;
        let available = self.inventory.set_available(product_id, quantity)?;
        self.sync_listing(product_id);
        info!("Stock for {} set to {}", product_id, available);
        Ok(available)
    }

    pub fn restock(&mut self, product_id: &Uuid, quantity: u32) -> Result<u32, StoreError> {
        self.catalog.product(product_id).ok_or(ProductError::NotFound(*product_id))?;
        let available = self.inventory.restock(product_id, quantity)?;
        self.sync_listing(product_id);
        Ok(available)
    }

    // ---- chat ----

    pub fn chat(&mut self, shopper_id: &str, message: &str) -> Result<ChatReply, StoreError> {
        let state = shopper_entry(&mut self.shoppers, shopper_id);
        Ok(state.chat.exchange(&self.chat_bot, message)?)
    }

    pub fn chat_history(&self, shopper_id: &str) -> Vec<ChatMessage> {
        self.shoppers
            .get(shopper_id)
            .map(|s| s.chat.messages.clone())
            .unwrap_or_default()
    }

    pub fn chat_greeting(&self) -> ChatReply {
        self.chat_bot.greeting()
    }

    // ---- persistence ----

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            users: self.auth.users().cloned().collect(),
            orders: self.orders.clone(),
            inventory: self.inventory.clone(),
            shoppers: self.shoppers.clone(),
        }
    }

    pub fn restore(&mut self, snapshot: StoreSnapshot) {
        if snapshot.version != SNAPSHOT_VERSION {
            warn!("Restoring snapshot version {} (expected {})", snapshot.version, SNAPSHOT_VERSION);
        }
        self.auth.restore_users(snapshot.users);
        self.orders = snapshot.orders;
        self.inventory = snapshot.inventory;
        self.shoppers = snapshot.shoppers;

        let listing_ids: Vec<Uuid> = self.catalog.products.iter().map(|p| p.id)
            .chain(self.catalog.pets.iter().map(|p| p.id))
            .filter(|id| self.inventory.get(id).is_some())
            .collect();
        for id in &listing_ids {
            self.sync_listing(id);
        }
        info!("Restored {} orders and {} shopper sessions", self.orders.all_orders().len(), self.shoppers.len());
    }
}

impl Default for Storefront {
    fn default() -> Self {
        Self::new(Catalog::mock(), StorefrontSettings::default())
    }
}
