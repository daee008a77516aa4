pub mod payment_book;
